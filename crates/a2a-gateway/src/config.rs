// Gateway server configuration, loadable either as a flat object or as an
// apiVersion/kind/metadata/spec envelope (the same dual-format convention
// `a2a_core::AgentCapabilityCard` uses for its own YAML resources).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GatewayConfigInput")]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
            timeout_secs: default_timeout(),
            max_body_bytes: default_max_body(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    30
}

fn default_max_body() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GatewayConfigInput {
    Flat(FlatGatewayConfig),
    Kubernetes(KubernetesGatewayConfig),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FlatGatewayConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_true")]
    cors: bool,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
    #[serde(default = "default_max_body")]
    max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct KubernetesGatewayConfig {
    #[serde(rename = "apiVersion")]
    #[allow(dead_code)]
    api_version: String,
    #[allow(dead_code)]
    kind: String,
    #[serde(default)]
    metadata: KubernetesMetadata,
    spec: GatewaySpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct KubernetesMetadata {
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GatewaySpec {
    #[serde(default)]
    server: FlatGatewayConfig,
}

fn default_true() -> bool {
    true
}

impl From<GatewayConfigInput> for GatewayConfig {
    fn from(input: GatewayConfigInput) -> Self {
        let flat = match input {
            GatewayConfigInput::Flat(f) => f,
            GatewayConfigInput::Kubernetes(k) => k.spec.server,
        };
        Self {
            host: flat.host,
            port: flat.port,
            cors: flat.cors,
            timeout_secs: flat.timeout_secs,
            max_body_bytes: flat.max_body_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_all_interfaces_on_8080() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn flat_config_deserializes() {
        let yaml = "port: 9000\nhost: 127.0.0.1\n";
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.cors);
    }

    #[test]
    fn kubernetes_style_config_deserializes() {
        let yaml = r#"
apiVersion: a2a.dev/v1
kind: GatewayConfig
metadata:
  name: gateway
spec:
  server:
    port: 9100
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 9100);
    }
}
