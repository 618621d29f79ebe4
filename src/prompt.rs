//! Prompt recognition for Cisco-IOS-like device shells.
//!
//! The device signals "ready for input" by printing a trailing prompt whose
//! shape encodes the current CLI mode. The session driver appends every chunk
//! it reads to a growing buffer and asks this module whether any of the
//! prompts it is waiting for has appeared yet.
//!
//! Matching is a multiline regex search over the whole accumulated buffer,
//! and the loop stops on the FIRST pattern that matches. Output that embeds a
//! prompt-looking substring mid-stream can therefore terminate a read early;
//! callers must not assume the buffer holds a complete response when the
//! match is not on the final line.

use once_cell::sync::Lazy;
use regex::Regex;

/// The prompt classes a Cisco-IOS-like shell can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    /// `Switch>`, unprivileged user EXEC mode.
    User,
    /// `Switch#`, privileged (enable) EXEC mode.
    Enable,
    /// `Switch(config)#`, global configuration mode.
    Config,
    /// `Switch(config-if)#`, interface configuration submode.
    InterfaceConfig,
    /// `Switch(config-vlan)#`, VLAN configuration submode.
    VlanConfig,
    /// Any other `Switch(config-...)#` submode, such as `config-router`,
    /// `config-ext-nacl` or `config-access-map`.
    SubConfig,
    /// `Password:`, an enable or login password request.
    Password,
    /// `Username:`, a login name request (telnet line authentication).
    Username,
    /// "Press RETURN to get started" banner after console attach.
    PressReturn,
    /// "Initial configuration dialog? [yes/no]:" setup wizard.
    InitialDialog,
}

static USER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+>\s*$").expect("user prompt regex")
});
static ENABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+#\s*$").expect("enable prompt regex")
});
static CONFIG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+\(config\)#\s*$").expect("config prompt regex")
});
static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+\(config-if\)#\s*$").expect("config-if prompt regex")
});
static VLAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+\(config-vlan\)#\s*$").expect("config-vlan prompt regex")
});
static SUB_CONFIG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[A-Za-z0-9_-]+\(config[^)]*\)#\s*$").expect("config submode prompt regex")
});
static PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)Password:\s*$").expect("password prompt regex"));
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)Username:\s*$").expect("username prompt regex"));
static PRESS_RETURN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Press RETURN to get started").expect("press-return regex"));
static INITIAL_DIALOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"initial configuration dialog\? \[yes/no\]:").expect("setup dialog regex")
});

impl Prompt {
    fn regex(self) -> &'static Regex {
        match self {
            Prompt::User => &USER_RE,
            Prompt::Enable => &ENABLE_RE,
            Prompt::Config => &CONFIG_RE,
            Prompt::InterfaceConfig => &INTERFACE_RE,
            Prompt::VlanConfig => &VLAN_RE,
            Prompt::SubConfig => &SUB_CONFIG_RE,
            Prompt::Password => &PASSWORD_RE,
            Prompt::Username => &USERNAME_RE,
            Prompt::PressReturn => &PRESS_RETURN_RE,
            Prompt::InitialDialog => &INITIAL_DIALOG_RE,
        }
    }

    /// Returns true if the pattern for this prompt matches anywhere in
    /// `text` (multiline).
    pub fn matches(self, text: &str) -> bool {
        self.regex().is_match(text)
    }

    /// Returns true if `line` on its own is this prompt.
    pub fn matches_line(self, line: &str) -> bool {
        self.regex().is_match(line.trim_end())
    }
}

/// Prompts a freshly attached console may present before login completes.
pub const INITIAL_PROMPTS: &[Prompt] = &[
    Prompt::PressReturn,
    Prompt::InitialDialog,
    Prompt::Username,
    Prompt::Password,
    Prompt::User,
    Prompt::Enable,
];

/// Tests `wanted` patterns in order against the accumulated buffer and
/// returns the first that matches.
pub fn find_first(text: &str, wanted: &[Prompt]) -> Option<Prompt> {
    wanted.iter().copied().find(|p| p.matches(text))
}

/// Returns true if `line` looks like any mode prompt (used when stripping
/// the trailing prompt from command output).
pub fn is_mode_prompt(line: &str) -> bool {
    const MODE_PROMPTS: &[Prompt] = &[
        Prompt::Config,
        Prompt::InterfaceConfig,
        Prompt::VlanConfig,
        Prompt::SubConfig,
        Prompt::Enable,
        Prompt::User,
    ];
    MODE_PROMPTS.iter().any(|p| p.matches_line(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_matches_trailing_line() {
        assert!(Prompt::User.matches("Switch>"));
        assert!(Prompt::User.matches("banner text\nSwitch> "));
        assert!(!Prompt::User.matches("Switch#"));
    }

    #[test]
    fn enable_prompt_does_not_match_config_prompts() {
        assert!(Prompt::Enable.matches("Switch#"));
        // ')' sits between the name and '#', so the enable class cannot match.
        assert!(!Prompt::Enable.matches("Switch(config)#"));
        assert!(!Prompt::Enable.matches("Switch(config-if)#"));
    }

    #[test]
    fn config_submodes_are_distinguished() {
        assert!(Prompt::Config.matches("Switch(config)#"));
        assert!(!Prompt::Config.matches("Switch(config-if)#"));
        assert!(Prompt::InterfaceConfig.matches("Switch(config-if)#"));
        assert!(Prompt::VlanConfig.matches("Switch(config-vlan)#"));
    }

    #[test]
    fn sub_config_prompt_covers_other_submodes() {
        assert!(Prompt::SubConfig.matches("Switch(config-router)#"));
        assert!(Prompt::SubConfig.matches("Switch(config-ext-nacl)# "));
        assert!(Prompt::SubConfig.matches("Switch(config-access-map)#"));
        assert!(Prompt::SubConfig.matches("Switch(config)#"));
        assert!(!Prompt::SubConfig.matches("Switch#"));
        assert!(is_mode_prompt("Switch(config-router)#"));
    }

    #[test]
    fn transient_prompts_match() {
        assert!(Prompt::Password.matches("User Access Verification\n\nPassword: "));
        assert!(Prompt::Username.matches("Username:"));
        assert!(Prompt::PressReturn.matches("\n\nPress RETURN to get started.\n"));
        assert!(
            Prompt::InitialDialog
                .matches("Would you like to enter the initial configuration dialog? [yes/no]:")
        );
    }

    #[test]
    fn find_first_honors_order_and_early_match() {
        // Both patterns are present; the first requested wins.
        let text = "Password: \nSwitch#";
        assert_eq!(
            find_first(text, &[Prompt::Enable, Prompt::Password]),
            Some(Prompt::Enable)
        );
        assert_eq!(
            find_first(text, &[Prompt::Config, Prompt::Password]),
            Some(Prompt::Password)
        );
        assert_eq!(find_first("no prompts here", &[Prompt::Enable]), None);
    }

    #[test]
    fn embedded_prompt_terminates_match_even_mid_buffer() {
        // A prompt-like line in the middle of output still matches; this is
        // the documented early-termination hazard.
        let text = "line one\nSwitch#\nmore output follows\n";
        assert!(Prompt::Enable.matches(text));
    }

    #[test]
    fn mode_prompt_detection_for_stripping() {
        assert!(is_mode_prompt("Switch#"));
        assert!(is_mode_prompt("Switch(config)# "));
        assert!(!is_mode_prompt("interface FastEthernet0/1"));
    }
}
