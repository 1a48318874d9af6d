/// Returns `true` if the HTTP status code means the replica served the request.
///
/// Only 2xx counts. Redirects are not followed, so 3xx is a failure like
/// any other and feeds failover.
///
/// # Examples
///
/// ```
/// use mogile_http::is_success;
///
/// assert!(is_success(200));
/// assert!(is_success(201));
/// assert!(!is_success(302));
/// assert!(!is_success(404));
/// ```
pub fn is_success(status: u16) -> bool { (200..300).contains(&status) }
