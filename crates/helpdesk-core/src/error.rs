use thiserror::Error;

use helpdesk_db::StoreError;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Prompt host error: {0}")]
    Host(#[from] HostError),
}
