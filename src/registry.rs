//! Static competition registry
//!
//! Maps the five supported league names to their provider identifiers:
//! a numeric code used by the cross-competition match endpoint and a
//! short path id used by competition-scoped endpoints. Built once at
//! startup and never mutated.

/// Colour triple used by the front-ends when theming a competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompetitionColors {
    pub bg: &'static str,
    pub fg: &'static str,
    pub accent: &'static str,
}

/// One registry entry for a supported competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompetitionInfo {
    /// Display name, also the key used throughout the store.
    pub name: &'static str,
    /// Path id for `/competitions/{id}/...` endpoints.
    pub id: &'static str,
    /// Numeric code for `/matches?competitions={code}`.
    pub code: u32,
    pub colors: CompetitionColors,
}

/// Immutable lookup table of supported competitions.
#[derive(Debug, Clone)]
pub struct CompetitionRegistry {
    entries: Vec<CompetitionInfo>,
}

impl CompetitionRegistry {
    pub fn new() -> Self {
        CompetitionRegistry {
            entries: vec![
                CompetitionInfo {
                    name: "Premier League",
                    id: "PL",
                    code: 2021,
                    colors: CompetitionColors {
                        bg: "#38003C",
                        fg: "#FFFFFF",
                        accent: "#00FF85",
                    },
                },
                CompetitionInfo {
                    name: "Ligue 1",
                    id: "FL1",
                    code: 2015,
                    colors: CompetitionColors {
                        bg: "#12233F",
                        fg: "#FFFFFF",
                        accent: "#E31E24",
                    },
                },
                CompetitionInfo {
                    name: "La Liga",
                    id: "PD",
                    code: 2014,
                    colors: CompetitionColors {
                        bg: "#FFD700",
                        fg: "#000000",
                        accent: "#C60B1E",
                    },
                },
                CompetitionInfo {
                    name: "Serie A",
                    id: "SA",
                    code: 2019,
                    colors: CompetitionColors {
                        bg: "#009246",
                        fg: "#FFFFFF",
                        accent: "#FFFFFF",
                    },
                },
                CompetitionInfo {
                    name: "Bundesliga",
                    id: "BL1",
                    code: 2002,
                    colors: CompetitionColors {
                        bg: "#D3010C",
                        fg: "#FFFFFF",
                        accent: "#FFFFFF",
                    },
                },
            ],
        }
    }

    /// Look up a competition by its display name.
    pub fn get(&self, name: &str) -> Option<&CompetitionInfo> {
        self.entries.iter().find(|c| c.name == name)
    }

    /// Numeric code for the cross-competition match endpoint.
    pub fn code(&self, name: &str) -> Option<u32> {
        self.get(name).map(|c| c.code)
    }

    /// Path id for competition-scoped endpoints.
    pub fn id(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|c| c.id)
    }

    /// All supported competition names, in registry order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|c| c.name).collect()
    }
}

impl Default for CompetitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
