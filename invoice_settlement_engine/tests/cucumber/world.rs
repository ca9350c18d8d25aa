use cucumber::World;
use invoice_settlement_engine::SettlementError;

use crate::support::TestSystem;

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<TestSystem>,
    pub last_error: Option<SettlementError>,
}

impl SettlementWorld {
    pub async fn system(&mut self) -> &TestSystem {
        if self.system.is_none() {
            self.system = Some(TestSystem::new().await);
        }
        self.system.as_ref().expect("System not initialised")
    }

    pub fn sys(&self) -> &TestSystem {
        self.system.as_ref().expect("System not initialised")
    }
}
