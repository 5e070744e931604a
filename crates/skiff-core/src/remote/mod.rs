//! Remote install sequence executed over ssh.

use crate::config::DeployConfig;
use crate::exec::{CommandLine, CommandRunner, ProcessOutput, run_checked};

/// Shell text for the install step: relocate everything rsync dropped into
/// the login user's home directory and activate the shipped crontab.
pub fn install_script(config: &DeployConfig) -> String {
    format!(
        "ssh {hostname} -t << EOL\n\
         sudo su -\n\
         mkdir -p {remote_dir}\n\
         mv /home/{remote_user}/* {remote_dir}/\n\
         crontab {remote_dir}/{crontab}\n\
         EOL\n",
        hostname = config.hostname,
        remote_dir = config.remote_dir,
        remote_user = config.remote_user,
        crontab = config.crontab_name(),
    )
}

/// The heredoc needs a real shell, so the script runs through `sh -c`.
pub fn install_command(config: &DeployConfig) -> CommandLine {
    CommandLine::new("sh").arg("-c").arg(install_script(config))
}

pub fn run_install(
    runner: &dyn CommandRunner,
    config: &DeployConfig,
) -> anyhow::Result<ProcessOutput> {
    tracing::info!("installing on {}", config.hostname);
    run_checked(runner, &install_command(config), "remote install")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_relocates_files_and_installs_crontab() {
        let script = install_script(&DeployConfig::default());
        assert!(script.starts_with("ssh aws-ec2-4 -t << EOL\n"));
        assert!(script.contains("sudo su -\n"));
        assert!(script.contains("mkdir -p /usr/local/bot\n"));
        assert!(script.contains("mv /home/ec2-user/* /usr/local/bot/\n"));
        assert!(script.contains("crontab /usr/local/bot/cron-settings.crontab\n"));
        assert!(script.ends_with("EOL\n"));
    }

    #[test]
    fn script_is_parameterized_by_hostname() {
        let config = DeployConfig {
            hostname: "h1".to_string(),
            ..DeployConfig::default()
        };
        let script = install_script(&config);
        assert!(script.starts_with("ssh h1 -t << EOL\n"));

        let fixed: Vec<&str> = script.lines().skip(1).collect();
        let default_fixed: Vec<String> = install_script(&DeployConfig::default())
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect();
        assert_eq!(fixed, default_fixed);
    }

    #[test]
    fn install_runs_through_a_shell() {
        let command = install_command(&DeployConfig::default());
        assert_eq!(command.program, "sh");
        assert_eq!(command.args[0], "-c");
        assert!(command.args[1].contains("<< EOL"));
    }
}
