use serde::{Deserialize, Serialize};

pub fn greet_route() -> &'static str {
    "/greet"
}

pub fn healthz_route() -> &'static str {
    "/healthz"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetResponse {
    pub greeting: String,
}
