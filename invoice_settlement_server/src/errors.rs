use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use invoice_settlement_engine::{InvoiceFlowError, InvoiceQueryError, MonitorError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the invoice. {0}")]
    Conflict(String),
    #[error("An upstream service is unavailable. {0}")]
    UpstreamUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<InvoiceQueryError> for ServerError {
    fn from(e: InvoiceQueryError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<MonitorError> for ServerError {
    fn from(e: MonitorError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::InvoiceNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::NotReadyForSettlement { .. }
            | SettlementError::SettlementInProgress(_)
            | SettlementError::NotRecoverable { .. }
            | SettlementError::NothingToSweep => Self::Conflict(e.to_string()),
            SettlementError::WalletError(_) | SettlementError::PriceUnavailable(_) => {
                Self::UpstreamUnavailable(e.to_string())
            },
            SettlementError::MissingCredential(_)
            | SettlementError::SweepNotRecorded { .. }
            | SettlementError::StoreError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<InvoiceFlowError> for ServerError {
    fn from(e: InvoiceFlowError) -> Self {
        match e {
            InvoiceFlowError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            InvoiceFlowError::PriceUnavailable(_) | InvoiceFlowError::WalletError(_) => {
                Self::UpstreamUnavailable(e.to_string())
            },
            InvoiceFlowError::StoreError(_) => Self::BackendError(e.to_string()),
        }
    }
}
