//! Part catalog - templates the generator picks from

/// A buildable part: behaviors by qualified type name, resources by name
/// with capacity.
#[derive(Debug, Clone, Copy)]
pub struct PartTemplate {
    pub name: &'static str,
    pub behaviors: &'static [&'static str],
    pub resources: &'static [(&'static str, f64)],
    pub mass: f32,
    /// Node-attached in the main stack rather than surface-mounted
    pub stacked: bool,
    /// The host must keep this part fully simulated
    pub always_simulate: bool,
}

pub static COMMAND_POD: PartTemplate = PartTemplate {
    name: "mk1pod",
    behaviors: &["Stock.ModuleCommand", "Stock.ModuleReactionWheel"],
    resources: &[("ElectricCharge", 50.0), ("MonoPropellant", 10.0)],
    mass: 0.8,
    stacked: true,
    always_simulate: false,
};

/// Main stack sections, top to bottom
pub static STACK_PARTS: &[PartTemplate] = &[
    PartTemplate {
        name: "fuelTank",
        behaviors: &[],
        resources: &[("LiquidFuel", 180.0), ("Oxidizer", 220.0)],
        mass: 0.25,
        stacked: true,
        always_simulate: false,
    },
    PartTemplate {
        name: "batteryBank",
        behaviors: &[],
        resources: &[("ElectricCharge", 1000.0)],
        mass: 0.05,
        stacked: true,
        always_simulate: false,
    },
    PartTemplate {
        name: "dockingPort",
        behaviors: &["Stock.ModuleDockingNode"],
        resources: &[],
        mass: 0.1,
        stacked: true,
        always_simulate: true,
    },
    PartTemplate {
        name: "probeCore",
        behaviors: &["Stock.ModuleCommand", "Stock.ModuleSAS"],
        resources: &[("ElectricCharge", 10.0)],
        mass: 0.1,
        stacked: true,
        always_simulate: false,
    },
];

pub static ENGINE: PartTemplate = PartTemplate {
    name: "liquidEngine",
    behaviors: &["Stock.ModuleEngines", "Stock.ModuleGimbal", "Stock.ModuleAlternator"],
    resources: &[],
    mass: 1.25,
    stacked: true,
    always_simulate: false,
};

/// Surface-mounted parts placed in symmetry groups
pub static RADIAL_PARTS: &[PartTemplate] = &[
    PartTemplate {
        name: "spotLight",
        behaviors: &["Stock.ModuleLight"],
        resources: &[],
        mass: 0.015,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "solarPanel",
        behaviors: &["Stock.ModuleDeployableSolarPanel"],
        resources: &[],
        mass: 0.025,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "antenna",
        behaviors: &["Stock.ModuleDataTransmitter", "Stock.ModuleDeployableAntenna"],
        resources: &[],
        mass: 0.005,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "thermometer",
        behaviors: &["Stock.ModuleEnviroSensor", "Stock.ModuleScienceExperiment"],
        resources: &[],
        mass: 0.005,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "radialBattery",
        behaviors: &[],
        resources: &[("ElectricCharge", 100.0)],
        mass: 0.02,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "rcsBlock",
        behaviors: &["Stock.ModuleRCSFX"],
        resources: &[],
        mass: 0.05,
        stacked: false,
        always_simulate: false,
    },
    PartTemplate {
        name: "ladder",
        behaviors: &["Stock.RetractableLadder"],
        resources: &[],
        mass: 0.005,
        stacked: false,
        always_simulate: false,
    },
];
