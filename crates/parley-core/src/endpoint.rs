/// Chat server the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Endpoint {
    Local,
    Lan,
    #[default]
    Production,
    Custom(String),
}

pub const LOCAL_URL: &str = "http://127.0.0.1:5000";
pub const LAN_URL: &str = "http://192.168.100.111:5000";
pub const PRODUCTION_URL: &str = "https://chatbot-flask-chat-api.vercel.app";

impl Endpoint {
    pub fn as_str(&self) -> &str {
        match self {
            Endpoint::Local => "local",
            Endpoint::Lan => "lan",
            Endpoint::Production => "production",
            Endpoint::Custom(url) => url.as_str(),
        }
    }

    /// Accepts a preset name or a literal `http(s)://` URL.
    pub fn from_str(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "local" | "localhost" => Some(Endpoint::Local),
            "lan" => Some(Endpoint::Lan),
            "production" | "prod" => Some(Endpoint::Production),
            lower if lower.starts_with("http://") || lower.starts_with("https://") => {
                Some(Endpoint::Custom(trimmed.trim_end_matches('/').to_string()))
            }
            _ => None,
        }
    }

    pub fn presets() -> Vec<Endpoint> {
        vec![Endpoint::Local, Endpoint::Lan, Endpoint::Production]
    }

    pub fn base_url(&self) -> &str {
        match self {
            Endpoint::Local => LOCAL_URL,
            Endpoint::Lan => LAN_URL,
            Endpoint::Production => PRODUCTION_URL,
            Endpoint::Custom(url) => url.as_str(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Endpoint::Local => "Local (127.0.0.1)",
            Endpoint::Lan => "LAN (192.168.100.111)",
            Endpoint::Production => "Production",
            Endpoint::Custom(url) => url.as_str(),
        }
    }
}
