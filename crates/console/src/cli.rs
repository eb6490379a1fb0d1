//! Command-line arguments for the `metroconsole` binary.

use clap::Parser;

/// Operations console for metrology management.
#[derive(Parser, Debug)]
#[command(name = "metroconsole")]
#[command(version, about, long_about = None)]
#[command(after_help = "The password for --login is read from METROCONSOLE_PASSWORD.")]
pub struct Args {
    /// Log in as USERNAME, then print the console state
    #[arg(long, value_name = "USERNAME", value_parser = non_blank, conflicts_with = "logout")]
    pub login: Option<String>,

    /// Clear the stored session
    #[arg(long)]
    pub logout: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restore the stored session and print the console state.
    Show,
    Login { username: String },
    Logout,
}

impl Args {
    pub fn into_command(self) -> Command {
        match (self.login, self.logout) {
            (Some(username), _) => Command::Login { username },
            (None, true) => Command::Logout,
            (None, false) => Command::Show,
        }
    }
}

fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("username must not be blank".to_string());
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Args::try_parse_from(std::iter::once("metroconsole").chain(args.iter().copied()))
            .map(Args::into_command)
    }

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_arguments_shows_state() {
        assert_eq!(parse(&[]).unwrap(), Command::Show);
    }

    #[test]
    fn login_takes_a_username() {
        assert_eq!(
            parse(&["--login", "ana"]).unwrap(),
            Command::Login {
                username: "ana".into()
            }
        );
        assert_eq!(
            parse(&["--login=bia"]).unwrap(),
            Command::Login {
                username: "bia".into()
            }
        );
        assert!(parse(&["--login"]).is_err());
        assert_eq!(
            parse(&["--login", " "]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn logout_cannot_be_combined_with_login() {
        assert_eq!(parse(&["--logout"]).unwrap(), Command::Logout);
        assert_eq!(
            parse(&["--logout", "--login", "ana"]).unwrap_err().kind(),
            ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn help_and_version_are_handled_by_the_parser() {
        assert_eq!(parse(&["-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["--version"]).unwrap_err().kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn rejects_unknown_and_extra_arguments() {
        assert_eq!(parse(&["--verbose"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert!(parse(&["--logout", "now"]).is_err());
    }
}
