use super::state::PhaseName;

pub struct PhaseDefinition {
    pub name: PhaseName,
    pub display_name: &'static str,
}

pub static PHASES: &[PhaseDefinition] = &[
    PhaseDefinition {
        name: PhaseName::Spidering,
        display_name: "Spidering",
    },
    PhaseDefinition {
        name: PhaseName::RegisteringContext,
        display_name: "Scan Context",
    },
    PhaseDefinition {
        name: PhaseName::ActiveScanning,
        display_name: "Active Scan",
    },
    PhaseDefinition {
        name: PhaseName::FetchingResults,
        display_name: "Fetching Results",
    },
];

pub fn display_name(phase: PhaseName) -> &'static str {
    PHASES
        .iter()
        .find(|p| p.name == phase)
        .map(|p| p.display_name)
        .unwrap_or("Unknown")
}
