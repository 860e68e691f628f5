//! Interactive prompts for login credentials.
//!
//! Both prompts go to stdout. When stdin is not a terminal the answers are
//! read line by line from it, so credentials can be piped in.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn prompt_username() -> io::Result<String> {
    print!("username: ");
    io::stdout().flush()?;

    read_username(&mut io::stdin().lock())
}

/// Masked password prompt on a terminal; a plain line read otherwise.
pub fn prompt_password() -> io::Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return rpassword::prompt_password("password: ");
    }

    print!("password: ");
    io::stdout().flush()?;

    read_password(&mut stdin.lock())
}

fn read_username(reader: &mut impl BufRead) -> io::Result<String> {
    let mut username = String::new();
    reader.read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn read_password(reader: &mut impl BufRead) -> io::Result<String> {
    rpassword::read_password_from_bufread(reader)
}
