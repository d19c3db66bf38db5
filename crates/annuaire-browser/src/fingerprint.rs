use rand::Rng;

/// Launch-time browser identity.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub language: String,
}

impl FingerprintConfig {
    /// Pick a common desktop user agent at random for the given window size.
    pub fn randomized(viewport_width: u32, viewport_height: u32) -> Self {
        let mut rng = rand::thread_rng();

        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36",
        ];

        let ua_idx = rng.gen_range(0..user_agents.len());

        Self {
            user_agent: user_agents[ua_idx].to_string(),
            viewport_width,
            viewport_height,
            language: "fr-FR".to_string(),
        }
    }

    /// Command-line switches carrying this identity.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.language),
        ]
    }
}
