use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

/**
 * Wrapper for the middleware configurations.
*/
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Configuration {
    ///Stack size of the spawned Reader/Sender/Acceptor/Timer threads in bytes.
    pub thread_stack_size: usize,

    ///Stack size of the main Middleware thread in bytes.
    pub middleware_thread_stack_size: usize,

    ///Invoke the local delivery handler synchronously on broadcast.
    pub deliver_locally: bool,

    ///Period of the retransmit scan in milliseconds.
    pub check_resend_interval_ms: u64,

    ///Age after which an unacknowledged cast is sent again, in milliseconds.
    pub resend_after_ms: u64,
}

impl Configuration {
    /**
     * Returns the retransmit scan period wrapped in a Duration.
     */
    pub fn get_check_resend_interval(&self) -> Duration {
        Duration::from_millis(self.check_resend_interval_ms)
    }

    /**
     * Returns the resend age threshold wrapped in a Duration.
     */
    pub fn get_resend_after(&self) -> Duration {
        Duration::from_millis(self.resend_after_ms)
    }
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration {
            thread_stack_size: 2 * 1024 * 1024,
            middleware_thread_stack_size: 8 * 1024 * 1024,
            deliver_locally: false,
            check_resend_interval_ms: 5000,
            resend_after_ms: 10000,
        }
    }
}

/**
 * Reads the middleware configuration from a TOML file.
 * An error is returned if not successful. Missing fields fall back to
 * the defaults.
 *
 * # Arguments
 *
 * `configuration_file_path` - path to the TOML configuration file.
 */
pub fn read_configuration_file(
    configuration_file_path: String,
) -> Result<Configuration, Box<dyn Error>> {
    let mut configuration_string = String::new();
    let mut file = File::open(configuration_file_path)?;

    file.read_to_string(&mut configuration_string)?;
    let configuration: Configuration = toml::from_str(&configuration_string)?;

    Ok(configuration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_timer_values() {
        let configuration = Configuration::default();

        assert!(!configuration.deliver_locally);
        assert_eq!(configuration.check_resend_interval_ms, 5000);
        assert_eq!(configuration.resend_after_ms, 10000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let configuration: Configuration =
            toml::from_str("deliver_locally = true\nresend_after_ms = 50").unwrap();

        assert!(configuration.deliver_locally);
        assert_eq!(configuration.resend_after_ms, 50);
        assert_eq!(configuration.check_resend_interval_ms, 5000);
    }
}
