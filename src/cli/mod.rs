pub mod bulk_email;
pub mod credentials;
pub mod login;
pub mod output;
pub mod post;

use clap::Subcommand;

pub use bulk_email::{cmd_bulk_email, BulkEmailArgs};
pub use login::{cmd_login, LoginArgs};
pub use output::OutputFormat;
pub use post::{cmd_post, PostArgs};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Post content to LinkedIn, Reddit or by email
    Post(PostArgs),

    /// Sign in by hand in a visible browser and save the session cookies
    Login(LoginArgs),

    /// Send one email draft to a list of recipients
    BulkEmail(BulkEmailArgs),
}
