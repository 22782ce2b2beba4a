//! Session gate for the local playground.

/// Fixed credential pair for local sessions. Change here if you need
/// different credentials; there is no account store behind this.
pub fn authenticate(username: &str, password: &str) -> bool {
    username == "test" && password == "playground123"
}
