//! Fault injection for test doubles

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Always,
    Never,
}

/// A fault is an error that is returned based on the [`When`]
#[derive(Clone, Copy, Debug)]
pub struct Fault {
    pub when: When,
}

impl Fault {
    pub fn always() -> Self {
        Self { when: When::Always }
    }

    pub fn triggers(&self) -> bool {
        self.when == When::Always
    }
}

impl Default for Fault {
    fn default() -> Self {
        Self { when: When::Never }
    }
}
