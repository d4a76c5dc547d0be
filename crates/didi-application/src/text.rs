//! Operator-facing titles and messages.

pub const BANNER: &str = r"
 ____    ___   ____    ___
|  _ \  |_ _| |  _ \  |_ _|
| | | |  | |  | | | |  | |
| |_| |  | |  | |_| |  | |
|____/  |___| |____/  |___|
";

// ===== Prompt titles =====

pub const WALLET_NAME_TITLE: &str = "Enter the wallet name";
pub const WALLET_PASSWORD_TITLE: &str = "Enter the wallet password";
pub const MENU_TITLE: &str = "Options";
pub const INVITATION_TITLE: &str = "Paste the invitation URL";
pub const MESSAGE_TITLE: &str = "Write your message";
pub const CREDENTIAL_OFFER_TITLE: &str = "Accept the credential offer?";
pub const PROOF_REQUEST_TITLE: &str = "Accept the proof request?";
pub const CONFIRM_TITLE: &str = "Are you sure?";
pub const VOTE_TITLE: &str = "Enter the number of your candidate";

// ===== Output =====

pub const CREATING_AGENT: &str = "Creating agent...";
pub const CONNECTION_ESTABLISHED: &str = "Connection established!";
pub const CREDENTIAL_PREVIEW: &str = "Credential preview:";
pub const CREDENTIAL_ACCEPTED: &str = "Credential offer accepted!";
pub const CREDENTIAL_DECLINED: &str = "Credential offer declined.";
pub const PROOF_DISCLOSURE: &str = "The following attributes will be disclosed:";
pub const PROOF_ACCEPTED: &str = "Proof request accepted!";
pub const PROOF_DECLINED: &str = "Proof request declined.";
pub const NO_CREDENTIALS: &str = "No credentials held.";
pub const NO_PROOFS: &str = "No proofs exchanged.";
pub const EXIT: &str = "Shutting down agent...\nExiting...";
pub const RESTART: &str = "Restarting agent...";
