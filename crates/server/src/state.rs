use std::sync::Arc;

use service::bulk_invite::BulkInviteService;
use service::invite::InviteService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub invites: InviteService,
    pub bulk: Arc<BulkInviteService>,
}

impl AppState {
    pub fn new(invites: InviteService, bulk: BulkInviteService) -> Self {
        Self { invites, bulk: Arc::new(bulk) }
    }
}
