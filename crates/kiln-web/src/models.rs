//! Wire types for the execution endpoint.

use serde::{Deserialize, Serialize};

/// One source file in an execute request.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteFile {
    /// The file name, echoed back in diagnostics.
    pub file_name: String,
    /// The source code.
    pub code: String,
}

/// Request payload for `POST /api/execute`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// The source files to compile and run together.
    pub files: Vec<ExecuteFile>,
    /// Text served as standard input during the run.
    #[serde(default)]
    pub input: Option<String>,
}

/// Response payload: captured output, formatted compile errors, or a
/// runtime fault message.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// The program's output.
    pub output: String,
}
