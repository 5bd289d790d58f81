/// Loads service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field names map to upper-case env
/// vars (`access_token_ttl_secs` reads `ACCESS_TOKEN_TTL_SECS`). Use
/// `#[serde(default = "...")]` for optional settings.
pub trait Config: Sized + serde::de::DeserializeOwned {
    /// Deserialize from the process environment.
    fn try_from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Deserialize from an explicit list of `(KEY, value)` pairs.
    fn from_pairs<I, K, V>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        envy::from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))
    }
}
