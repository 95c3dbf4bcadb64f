//! Print a bcrypt hash for a password, ready to paste into a DBMON_USERS
//! entry: `user:<hash>`.

use dbmon_api::auth::credentials::hash_password;

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(password) = args.next() else {
        eprintln!("usage: mkhash <password> [cost]");
        std::process::exit(2);
    };
    let cost = args.next().and_then(|c| c.parse().ok());

    match hash_password(&password, cost) {
        Ok(hash) => println!("{}", hash),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
