use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "FREE",
            Plan::Premium => "PREMIUM",
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Plan::Free),
            "PREMIUM" => Ok(Plan::Premium),
            _ => Err(format!("Invalid plan: {}", s)),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-period resource cap. `Unlimited` disables the check entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Capped(u64),
}

impl Limit {
    /// Maps the configuration sentinel (negative = unlimited) to a limit.
    pub fn from_config(value: i64) -> Self {
        if value < 0 {
            Limit::Unlimited
        } else {
            Limit::Capped(value as u64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub documents_per_month: Limit,
    pub ai_tokens_per_month: Limit,
    pub chat_messages_per_document: Limit,
}

/// Static plan → limits mapping, built once from configuration and passed
/// into every quota-consuming component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimitTable {
    pub free: PlanLimits,
    pub premium: PlanLimits,
}

impl PlanLimitTable {
    pub fn limits(&self, plan: Plan) -> PlanLimits {
        match plan {
            Plan::Free => self.free,
            Plan::Premium => self.premium,
        }
    }
}

impl Default for PlanLimitTable {
    fn default() -> Self {
        Self {
            free: PlanLimits {
                documents_per_month: Limit::Capped(3),
                ai_tokens_per_month: Limit::Capped(50_000),
                chat_messages_per_document: Limit::Capped(50),
            },
            premium: PlanLimits {
                documents_per_month: Limit::Unlimited,
                ai_tokens_per_month: Limit::Unlimited,
                chat_messages_per_document: Limit::Unlimited,
            },
        }
    }
}
