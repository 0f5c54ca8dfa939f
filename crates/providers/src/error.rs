use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    Disabled(&'static str),
    #[error("{provider} request failed")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned http {status}: {body}")]
    HttpStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} returned status {status}: {message}")]
    Api {
        provider: &'static str,
        status: String,
        message: String,
    },
    #[error("{provider} response could not be parsed: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Name of the upstream that produced the error, used as a log field.
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Disabled(provider) => provider,
            Self::Transport { provider, .. }
            | Self::HttpStatus { provider, .. }
            | Self::Api { provider, .. }
            | Self::Malformed { provider, .. } => provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_names_its_provider() {
        assert_eq!(ProviderError::Disabled("gemini").provider(), "gemini");
        let api = ProviderError::Api {
            provider: "google_places",
            status: "REQUEST_DENIED".to_string(),
            message: "bad key".to_string(),
        };
        assert_eq!(api.provider(), "google_places");
        let malformed = ProviderError::Malformed {
            provider: "gemini",
            message: "no candidates".to_string(),
        };
        assert_eq!(malformed.provider(), "gemini");
        assert_eq!(
            malformed.to_string(),
            "gemini response could not be parsed: no candidates"
        );
    }
}
