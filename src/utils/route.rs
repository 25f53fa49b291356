//! Route pattern extraction utilities.

use actix_web::HttpRequest;

/// Route label for metrics
///
/// Uses the matched resource pattern (e.g. `/api/posts/{id}`) so numeric ids
/// do not explode label cardinality. Unmatched requests share one label.
pub fn extract_route_pattern(req: &HttpRequest) -> String {
    req.match_pattern()
        .unwrap_or_else(|| "/unmatched".to_string())
}
