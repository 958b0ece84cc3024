use shared::{
    error::{ApiError, ErrorCode},
    protocol::GreetResponse,
};

#[derive(Debug, Clone)]
pub struct ApiContext {
    pub max_name_bytes: usize,
}

/// The service's one operation. Any name within the length limit is accepted,
/// including the empty one.
pub fn greet(ctx: &ApiContext, name: &str) -> Result<GreetResponse, ApiError> {
    if name.len() > ctx.max_name_bytes {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!(
                "name is {} bytes; at most {} allowed",
                name.len(),
                ctx.max_name_bytes
            ),
        ));
    }

    Ok(GreetResponse {
        greeting: format!("Hello, {name}!"),
    })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
