use thiserror::Error;

/// Errors that can occur while loading grids or resolving scopes
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheet not found: {name}")]
    SheetNotFound { name: String },

    #[error("Invalid scope '{scope}': {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("Grid for sheet '{sheet}' does not fit on a worksheet (anchor {anchor}, {rows} rows x {cols} cols)")]
    GridOutOfBounds {
        sheet: String,
        anchor: String,
        rows: usize,
        cols: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
