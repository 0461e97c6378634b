use std::env;

use anyhow::{Context, Result};
use diesel::prelude::*;
use uuid::Uuid;

use jobtrail::{auth::password, config::AppConfig, db, models::NewUser, schema::users};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let mut args = env::args().skip(1);
    let (email, name, pass) = match (args.next(), args.next(), args.next()) {
        (Some(email), Some(name), Some(pass)) => (email, name, pass),
        _ => {
            eprintln!("Usage: create_user <email> <name> <password>");
            std::process::exit(1);
        }
    };

    let config = AppConfig::from_env()?;
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let user = NewUser {
        id: Uuid::new_v4(),
        email,
        name,
        password_hash: password::hash_password(&pass)?,
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)
        .context("failed to insert user")?;

    println!("{}", user.id);
    Ok(())
}
