// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Read-side query forwarding. Opaque query payloads are JSON
//! `{method, params}` requests re-issued against the node's read-only RPC
//! surface; nothing on this path mutates state.

use serde::Deserialize;
use serde_json::Value;
use std::{error, fmt};

/// Failure anywhere on the forwarding path, carrying the upstream message.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError(pub String);

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl error::Error for QueryError {}

/// The read-only RPC surface queries are forwarded to, injected at
/// construction.
pub trait RpcClient: Send + Sync {
    fn call(&self, method: &str, params: &[Value])
        -> Result<Value, QueryError>;
}

#[derive(Debug, Deserialize)]
struct JsonRequest {
    method: String,
    params: Vec<Value>,
}

/// Decodes the payload, invokes the client, re-encodes the result.
pub fn forward_query(
    client: &dyn RpcClient, data: &[u8],
) -> Result<Vec<u8>, QueryError> {
    let request: JsonRequest = serde_json::from_slice(data)
        .map_err(|e| QueryError(e.to_string()))?;
    let result = client.call(&request.method, &request.params)?;
    serde_json::to_vec(&result).map_err(|e| QueryError(e.to_string()))
}
