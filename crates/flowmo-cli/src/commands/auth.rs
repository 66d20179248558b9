use clap::Subcommand;
use flowmo_core::storage::Store;
use flowmo_core::Database;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as the given user
    Login {
        /// User id
        user: String,
    },
    /// Sign out
    Logout,
    /// Print the signed-in user
    Whoami,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        AuthAction::Login { user } => {
            db.sign_in(&user)?;
            println!("signed in as {user}");
        }
        AuthAction::Logout => {
            db.sign_out()?;
            println!("signed out");
        }
        AuthAction::Whoami => match db.current_user()? {
            Some(user) => println!("{user}"),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
