use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    Production,
    #[default]
    Development,
    Testing,
}

impl Stage {
    pub fn is_production(&self) -> bool {
        matches!(self, Stage::Production)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Stage::Production => "production",
            Stage::Development => "development",
            Stage::Testing => "testing",
        };
        write!(f, "{}", stage)
    }
}

impl TryFrom<&str> for Stage {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Stage::Production),
            "development" | "dev" => Ok(Stage::Development),
            "testing" | "test" => Ok(Stage::Testing),
            other => Err(anyhow::anyhow!("unknown stage: {other}")),
        }
    }
}
