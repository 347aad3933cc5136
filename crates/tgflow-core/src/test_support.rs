//! Shared fixtures for unit tests

use crate::update::{BotIdentity, Update};

/// Bot whose client is just its name
pub(crate) struct TestBot {
    client: String,
}

impl TestBot {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            client: name.to_string(),
        }
    }
}

impl BotIdentity for TestBot {
    type Client = String;

    fn client(&self) -> &String {
        &self.client
    }

    fn name(&self) -> &str {
        &self.client
    }
}

/// Update carrying a static label and a numbered scope
pub(crate) type TestUpdate = Update<&'static str, TestBot, u32>;
