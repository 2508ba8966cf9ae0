//! Error handling for the Atelier Orders backend
//!
//! Provides consistent error responses in English and French

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{InvalidTransition, LedgerError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Missing unit cost for {0}")]
    MissingUnitCost(String),

    #[error("Invalid transaction direction: {0}")]
    InvalidDirection(String),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Order has no outstanding reservation")]
    NothingReserved,

    // State machine errors
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    // Carrier errors
    #[error("No territory matches '{0}'")]
    TerritoryNotFound(String),

    #[error("Carrier unavailable: {0}")]
    CarrierUnavailable(String),

    #[error("Carrier rejected the shipment: {0}")]
    CarrierRejected(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidQuantity(q) => AppError::InvalidQuantity(q),
            LedgerError::MissingUnitCost(kind) => {
                AppError::MissingUnitCost(kind.as_str().to_string())
            }
            LedgerError::InvalidDirection(kind, direction) => AppError::InvalidDirection(format!(
                "{} cannot be {}",
                kind.as_str(),
                direction.as_str()
            )),
            LedgerError::InsufficientStock {
                requested,
                available,
            } => AppError::InsufficientStock {
                requested,
                available,
            },
            LedgerError::NothingReserved => AppError::NothingReserved,
        }
    }
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        AppError::InvalidTransition(err.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_fr,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_fr: message_fr.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_fr: format!("{} introuvable", resource),
                    field: None,
                },
            ),
            AppError::InvalidQuantity(q) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_QUANTITY".to_string(),
                    message_en: format!("Transaction quantity must be positive, got {}", q),
                    message_fr: format!("La quantité doit être positive, reçu {}", q),
                    field: Some("quantity".to_string()),
                },
            ),
            AppError::MissingUnitCost(kind) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "MISSING_UNIT_COST".to_string(),
                    message_en: format!("Unit cost is required for {} transactions", kind),
                    message_fr: format!(
                        "Le coût unitaire est requis pour les transactions {}",
                        kind
                    ),
                    field: Some("unit_cost".to_string()),
                },
            ),
            AppError::InvalidDirection(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_DIRECTION".to_string(),
                    message_en: msg.clone(),
                    message_fr: format!("Sens de transaction invalide: {}", msg),
                    field: Some("direction".to_string()),
                },
            ),
            AppError::InsufficientStock {
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock: requested {}, available {}",
                        requested, available
                    ),
                    message_fr: format!(
                        "Stock insuffisant: demandé {}, disponible {}",
                        requested, available
                    ),
                    field: None,
                },
            ),
            AppError::NothingReserved => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "NOTHING_RESERVED".to_string(),
                    message_en: "Order has no outstanding reservation".to_string(),
                    message_fr: "Aucune réservation en cours pour cette commande".to_string(),
                    field: None,
                },
            ),
            AppError::InvalidTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_fr: format!("Changement de statut impossible: {}", msg),
                    field: None,
                },
            ),
            AppError::TerritoryNotFound(name) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "TERRITORY_NOT_FOUND".to_string(),
                    message_en: format!("No territory matches '{}'", name),
                    message_fr: format!("Aucune zone de livraison ne correspond à '{}'", name),
                    field: Some("customer_wilaya".to_string()),
                },
            ),
            AppError::CarrierUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "CARRIER_UNAVAILABLE".to_string(),
                    message_en: format!("Carrier unavailable: {}", msg),
                    message_fr: format!("Transporteur indisponible: {}", msg),
                    field: None,
                },
            ),
            AppError::CarrierRejected(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "CARRIER_REJECTED".to_string(),
                    message_en: format!("Carrier rejected the shipment: {}", msg),
                    message_fr: format!("Le transporteur a refusé l'expédition: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_fr: "Une erreur de base de données est survenue".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_fr: "Erreur interne du serveur".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_fr: "Erreur interne du serveur".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
