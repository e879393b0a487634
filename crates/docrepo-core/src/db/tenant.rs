///
/// TenantResolver
///
/// Supplies the prefix and suffix wrapped around the database name.
/// Called once per accessor construction.
///

pub trait TenantResolver: Send + Sync {
    fn prefix(&self) -> String;

    fn suffix(&self) -> String {
        String::new()
    }
}

///
/// FixedTenant
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FixedTenant {
    pub prefix: String,
    pub suffix: String,
}

impl FixedTenant {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl TenantResolver for FixedTenant {
    fn prefix(&self) -> String {
        self.prefix.clone()
    }

    fn suffix(&self) -> String {
        self.suffix.clone()
    }
}
