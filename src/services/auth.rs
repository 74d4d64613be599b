use crate::models::{Account, AccountUpdate, Profile, Registration, User, UserRole};
use crate::services::mail::{MailMessage, Mailer};
use crate::services::validation::{is_valid_email, required, FormErrors, ServiceError, ServiceResult};
use crate::Database;
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, seq::SliceRandom, Rng, RngCore};
use rusqlite::{Connection, OptionalExtension};

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 150;
const MAX_FULL_NAME_LENGTH: usize = 100;
const GENERATED_PASSWORD_LENGTH: usize = 12;

const ACCOUNT_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.role, u.created_at, u.updated_at,
           p.id, p.full_name, p.image
    FROM users u
    JOIN profiles p ON p.user_id = u.id
"#;

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        anyhow::bail!(
            "Username must be {} characters or less",
            MAX_USERNAME_LENGTH
        );
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        anyhow::bail!("Username can only contain letters, numbers, dots, underscores, and hyphens");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }
    if !is_valid_email(email) {
        anyhow::bail!("Enter a valid email address");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        anyhow::bail!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        );
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        anyhow::bail!("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        anyhow::bail!("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        anyhow::bail!("Password must contain at least one number");
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String> {
    validate_password(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dW5rbm93bg$0000000000000000000000000000000000000000000";

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                let _ = Argon2::default().verify_password(password.as_bytes(), &dummy);
            }
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Random password that satisfies [`validate_password`].
pub fn generate_password() -> String {
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"23456789";

    let mut rng = OsRng;
    let pick = |rng: &mut OsRng, set: &[u8]| set[rng.gen_range(0..set.len())] as char;

    let mut chars = vec![
        pick(&mut rng, LOWER),
        pick(&mut rng, UPPER),
        pick(&mut rng, DIGITS),
    ];
    let pool: Vec<u8> = [LOWER, UPPER, DIGITS].concat();
    while chars.len() < GENERATED_PASSWORD_LENGTH {
        chars.push(pick(&mut rng, pool.as_slice()));
    }
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}

fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    let user_id: i64 = row.get(0)?;
    Ok(Account {
        user: User {
            id: user_id,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get::<_, String>(4)?.parse().unwrap_or_default(),
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        },
        profile: Profile {
            id: row.get(7)?,
            user_id,
            full_name: row.get(8)?,
            image: row.get(9)?,
        },
    })
}

fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
    full_name: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
        (username, email, password_hash, role.to_string()),
    )?;
    let user_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO profiles (user_id, full_name) VALUES (?, ?)",
        (user_id, full_name),
    )?;
    Ok(user_id)
}

/// Creates a user and its profile. The profile's display name starts out as
/// the username.
pub fn create_user(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> Result<i64> {
    validate_username(username)?;
    validate_email(email)?;
    let password_hash = hash_password(password)?;
    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    let user_id = insert_user(&tx, username, email, &password_hash, role, username)?;
    tx.commit()?;
    Ok(user_id)
}

fn username_taken(conn: &Connection, username: &str, except: Option<i64>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ? COLLATE NOCASE AND id != ?",
        (username, except.unwrap_or(0)),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn email_taken(conn: &Connection, email: &str, except: Option<i64>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND id != ?",
        (email, except.unwrap_or(0)),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn register(db: &Database, form: &Registration) -> ServiceResult<Account> {
    let username = form.username.trim();
    let email = form.email.trim();
    let full_name = form.full_name.trim();

    let mut errors = FormErrors::new();
    let conn = db.get()?;

    if let Err(e) = validate_username(username) {
        errors.add("username", e.to_string());
    } else if username_taken(&conn, username, None)? {
        errors.add("username", "User already exist");
    }

    if let Err(e) = validate_email(email) {
        errors.add("email", e.to_string());
    } else if email_taken(&conn, email, None)? {
        errors.add("email", "Email already exist");
    }

    required(&mut errors, "full_name", full_name, Some(MAX_FULL_NAME_LENGTH));

    if let Err(e) = validate_password(&form.password) {
        errors.add("password", e.to_string());
    }
    if form.password != form.confirm_password {
        errors.add("confirm_password", "Passwords do not match");
    }
    errors.into_result()?;
    drop(conn);

    let password_hash = hash_password(&form.password)?;
    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    let user_id = insert_user(
        &tx,
        username,
        email,
        &password_hash,
        UserRole::Reader,
        full_name,
    )?;
    tx.commit()?;
    drop(conn);

    tracing::info!("Registered user '{}'", username);
    get_account(db, user_id)?.ok_or(ServiceError::NotFound("User"))
}

pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            &format!("{} WHERE u.username = ? COLLATE NOCASE", ACCOUNT_SELECT),
            [username],
            row_to_account,
        )
        .optional()?;

    match account {
        Some(a) if verify_password(password, &a.user.password_hash) => Ok(Some(a)),
        Some(_) => Ok(None),
        None => {
            verify_password(password, DUMMY_HASH);
            Ok(None)
        }
    }
}

/// Login that tells "no such user" apart from "bad password", matching the
/// username case-insensitively.
pub fn login(db: &Database, username: &str, password: &str) -> ServiceResult<Account> {
    let username = username.trim();
    let conn = db.get()?;
    let matches: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ? COLLATE NOCASE",
        [username],
        |row| row.get(0),
    )?;
    drop(conn);

    if matches != 1 {
        return Err(ServiceError::invalid("username", "User not found"));
    }

    authenticate(db, username, password)?
        .ok_or_else(|| ServiceError::invalid("password", "Wrong password"))
}

pub fn update_password(db: &Database, username: &str, password: &str) -> Result<()> {
    let password_hash = hash_password(password)?;
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET password_hash = ?, updated_at = CURRENT_TIMESTAMP WHERE username = ? COLLATE NOCASE",
        (&password_hash, username),
    )?;
    if affected == 0 {
        anyhow::bail!("User '{}' not found", username);
    }
    Ok(())
}

pub fn set_role(db: &Database, username: &str, role: UserRole) -> Result<()> {
    let conn = db.get()?;
    let affected = conn.execute(
        "UPDATE users SET role = ?, updated_at = CURRENT_TIMESTAMP WHERE username = ? COLLATE NOCASE",
        (role.to_string(), username),
    )?;
    if affected == 0 {
        anyhow::bail!("User '{}' not found", username);
    }
    Ok(())
}

pub fn create_session(db: &Database, user_id: i64, duration_days: i64) -> Result<String> {
    let token = generate_session_token();
    let conn = db.get()?;
    conn.execute(
        "INSERT INTO sessions (user_id, token, expires_at) VALUES (?, ?, datetime('now', ?||' days'))",
        (user_id, &token, duration_days),
    )?;
    Ok(token)
}

pub fn validate_session(db: &Database, token: &str) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            &format!(
                "{} JOIN sessions s ON s.user_id = u.id WHERE s.token = ? AND s.expires_at > datetime('now')",
                ACCOUNT_SELECT
            ),
            [token],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

pub fn delete_session(db: &Database, token: &str) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?", [token])?;
    Ok(())
}

pub fn cleanup_expired_sessions(db: &Database) -> Result<usize> {
    let conn = db.get()?;
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;
    Ok(deleted)
}

pub fn get_account(db: &Database, user_id: i64) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            &format!("{} WHERE u.id = ?", ACCOUNT_SELECT),
            [user_id],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

pub fn get_account_by_username(db: &Database, username: &str) -> Result<Option<Account>> {
    let conn = db.get()?;
    let account = conn
        .query_row(
            &format!("{} WHERE u.username = ? COLLATE NOCASE", ACCOUNT_SELECT),
            [username],
            row_to_account,
        )
        .optional()?;
    Ok(account)
}

pub fn profile_exists(db: &Database, profile_id: i64) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE id = ?",
        [profile_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_accounts(db: &Database) -> Result<Vec<Account>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!("{} ORDER BY u.created_at DESC, u.id DESC", ACCOUNT_SELECT))?;
    let accounts = stmt
        .query_map([], row_to_account)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

pub fn delete_user(db: &Database, username: &str) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute(
        "DELETE FROM users WHERE username = ? COLLATE NOCASE",
        [username],
    )?;
    Ok(affected > 0)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Applies the non-empty fields of `form` to `account`.
///
/// A new password needs a matching confirmation and the current password.
pub fn update_account(
    db: &Database,
    account: &Account,
    form: &AccountUpdate,
) -> ServiceResult<Account> {
    let user_id = account.user.id;
    let username = non_empty(&form.username);
    let email = non_empty(&form.email);
    let full_name = non_empty(&form.full_name);
    let new_password = form.new_password.as_deref().filter(|p| !p.is_empty());
    let confirm_password = form.confirm_password.as_deref().filter(|p| !p.is_empty());

    let mut errors = FormErrors::new();
    let conn = db.get()?;

    if let Some(username) = username {
        if let Err(e) = validate_username(username) {
            errors.add("username", e.to_string());
        } else if username_taken(&conn, username, Some(user_id))? {
            errors.add("username", "This username already exists");
        }
    }

    if let Some(email) = email {
        if let Err(e) = validate_email(email) {
            errors.add("email", e.to_string());
        } else if email_taken(&conn, email, Some(user_id))? {
            errors.add("email", "This email already exists");
        }
    }

    if let Some(full_name) = full_name {
        required(&mut errors, "full_name", full_name, Some(MAX_FULL_NAME_LENGTH));
    }

    if new_password.is_some() || confirm_password.is_some() {
        if new_password != confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        } else if let Some(password) = new_password {
            if let Err(e) = validate_password(password) {
                errors.add("new_password", e.to_string());
            }
        }
        match form.old_password.as_deref().filter(|p| !p.is_empty()) {
            None => errors.add("old_password", "Enter your current password"),
            Some(old) if !verify_password(old, &account.user.password_hash) => {
                errors.add("old_password", "Wrong password")
            }
            Some(_) => {}
        }
    }
    errors.into_result()?;
    drop(conn);

    let password_hash = new_password.map(hash_password).transpose()?;

    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    if let Some(username) = username {
        tx.execute("UPDATE users SET username = ? WHERE id = ?", (username, user_id))?;
    }
    if let Some(email) = email {
        tx.execute("UPDATE users SET email = ? WHERE id = ?", (email, user_id))?;
    }
    if let Some(full_name) = full_name {
        tx.execute(
            "UPDATE profiles SET full_name = ? WHERE user_id = ?",
            (full_name, user_id),
        )?;
    }
    if let Some(hash) = &password_hash {
        tx.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            (hash, user_id),
        )?;
    }
    tx.execute(
        "UPDATE users SET updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        [user_id],
    )?;
    tx.commit()?;
    drop(conn);

    get_account(db, user_id)?.ok_or(ServiceError::NotFound("User"))
}

/// Replaces the password of the account registered under `email` with a
/// generated one and mails it to the owner. Returns the address it was sent
/// to.
pub fn reset_password(db: &Database, mailer: &dyn Mailer, email: &str) -> ServiceResult<String> {
    let email = email.trim();
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT username, email FROM users WHERE email = ? COLLATE NOCASE")?;
    let matches = stmt
        .query_map([email], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);
    drop(conn);

    let (username, address) = match matches.as_slice() {
        [single] => single.clone(),
        _ => return Err(ServiceError::invalid("email", "User not found!")),
    };

    let password = generate_password();
    update_password(db, &username, &password)?;

    mailer.send(&MailMessage {
        to: address.clone(),
        subject: "Reset password".to_string(),
        body: format!("New password for {} is {}", username, password),
    })?;

    tracing::info!("Password reset for '{}'", username);
    Ok(address)
}
