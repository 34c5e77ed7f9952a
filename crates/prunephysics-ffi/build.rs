use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let header = PathBuf::from(&crate_dir).join("prunephysics.h");

    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("PRUNEPHYSICS_H")
        .with_cpp_compat(true)
        .with_documentation(true)
        .with_sys_include("stddef.h")
        .generate()
        .expect("Unable to generate prunephysics.h")
        .write_to_file(header);
}
