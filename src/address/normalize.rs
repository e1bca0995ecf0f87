/// Scheme prefixes stripped during normalization
const SCHEME_PREFIXES: &[&str] = &["ws://", "wss://", "http://", "https://"];

/// Normalizes a relay address into its canonical name
///
/// The canonical name is the identity of a relay everywhere in the crawler: it
/// keys the visited set and every Relay node in the graph. Two addresses with the
/// same canonical name are the same relay.
///
/// # Normalization Steps
///
/// 1. Remove every `ws://`, `wss://`, `http://` and `https://` occurrence
/// 2. Remove every `/`
/// 3. Remove all whitespace
///
/// The result contains no `/` and no whitespace, so applying the function twice
/// gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use relay_miner::address::clean_name;
///
/// assert_eq!(clean_name("wss://relay.damus.io/"), "relay.damus.io");
/// assert_eq!(clean_name(" ws://nos.lol "), "nos.lol");
/// ```
pub fn clean_name(address: &str) -> String {
    let mut name = address.to_string();
    for prefix in SCHEME_PREFIXES {
        name = name.replace(prefix, "");
    }
    name.retain(|c| c != '/' && !c.is_whitespace());
    name
}
