//! In-memory stand-in for the Gixen `api.php` endpoint.
//!
//! Speaks the same plain-text protocol as the real service: every command is
//! a GET with `username`, `password` and `notags` in the query, answers are
//! sentinel lines, and listings join fields with `|#!#|`. Snipes live in two
//! independent lists, one per server.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};

pub const FIELD_DELIMITER: &str = "|#!#|";

pub const ERR_AUTH: u32 = 5;
pub const ERR_MISSING_BID: u32 = 3;
pub const ERR_NOT_FOUND: u32 = 8;
pub const ERR_UNKNOWN_COMMAND: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Server {
    Main,
    Mirror,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snipe {
    pub item_id: String,
    pub end_time: String,
    pub max_bid: String,
    pub status: String,
    pub message: String,
    pub title: String,
    pub snipe_group: String,
    pub quantity: String,
    pub bid_offset: String,
}

impl Snipe {
    /// A freshly scheduled snipe with service-side defaults.
    pub fn scheduled(item_id: &str, max_bid: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            end_time: "2024-01-01 00:00:00".to_string(),
            max_bid: max_bid.to_string(),
            status: "ACTIVE".to_string(),
            message: String::new(),
            title: format!("Item {item_id}"),
            snipe_group: "0".to_string(),
            quantity: "1".to_string(),
            bid_offset: "6".to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == "DONE"
    }

    fn to_line(&self) -> String {
        [
            &self.item_id,
            &self.end_time,
            &self.max_bid,
            &self.status,
            &self.message,
            &self.title,
            &self.snipe_group,
            &self.quantity,
            &self.bid_offset,
        ]
        .map(String::as_str)
        .join(FIELD_DELIMITER)
    }
}

#[derive(Debug)]
pub struct Account {
    username: String,
    password: String,
    main: Vec<Snipe>,
    mirror: Vec<Snipe>,
}

impl Account {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            main: Vec::new(),
            mirror: Vec::new(),
        }
    }

    pub fn with_snipe(mut self, server: Server, snipe: Snipe) -> Self {
        self.snipes_mut(server).push(snipe);
        self
    }

    pub fn snipes(&self, server: Server) -> &[Snipe] {
        match server {
            Server::Main => &self.main,
            Server::Mirror => &self.mirror,
        }
    }

    fn snipes_mut(&mut self, server: Server) -> &mut Vec<Snipe> {
        match server {
            Server::Main => &mut self.main,
            Server::Mirror => &mut self.mirror,
        }
    }

    fn upsert(&mut self, server: Server, snipe: Snipe) {
        let list = self.snipes_mut(server);
        match list.iter_mut().find(|s| s.item_id == snipe.item_id) {
            Some(existing) => *existing = snipe,
            None => list.push(snipe),
        }
    }

    fn remove(&mut self, item_id: &str) -> bool {
        let before = self.main.len() + self.mirror.len();
        self.main.retain(|s| s.item_id != item_id);
        self.mirror.retain(|s| s.item_id != item_id);
        before != self.main.len() + self.mirror.len()
    }

    fn purge(&mut self) -> usize {
        let before = self.main.len() + self.mirror.len();
        self.main.retain(|s| !s.is_completed());
        self.mirror.retain(|s| !s.is_completed());
        before - (self.main.len() + self.mirror.len())
    }
}

pub type Db = Arc<RwLock<Account>>;

pub fn app(account: Account) -> Router {
    app_with_db(Arc::new(RwLock::new(account)))
}

/// Router over shared state, so tests can inspect the account afterwards.
pub fn app_with_db(db: Db) -> Router {
    Router::new().route("/api.php", get(api)).with_state(db)
}

pub async fn run(listener: TcpListener, account: Account) -> Result<(), std::io::Error> {
    axum::serve(listener, app(account)).await
}

fn error(code: u32, text: &str) -> String {
    format!("ERROR ({code}): {text}")
}

async fn api(State(db): State<Db>, Query(params): Query<HashMap<String, String>>) -> String {
    let param = |key: &str| params.get(key).map(String::as_str);
    let mut account = db.write().await;

    if param("username") != Some(account.username.as_str())
        || param("password") != Some(account.password.as_str())
    {
        tracing::info!(username = ?param("username"), "rejected credentials");
        return error(ERR_AUTH, "invalid user");
    }
    // Without notags the service wraps its terminator lines in markup.
    let br = if param("notags") == Some("1") { "" } else { "<br />" };

    if let Some(item) = param("itemid") {
        let Some(bid) = param("maxbid") else {
            return error(ERR_MISSING_BID, "maxbid is required");
        };
        let mut snipe = Snipe::scheduled(item, bid);
        if let Some(group) = param("snipegroup") {
            snipe.snipe_group = group.to_string();
        }
        if let Some(quantity) = param("quantity") {
            snipe.quantity = quantity.to_string();
        }
        if let Some(offset) = param("bidoffset") {
            snipe.bid_offset = offset.to_string();
        }
        if let Some(offset) = param("bidoffsetmirror") {
            let mut mirrored = snipe.clone();
            mirrored.bid_offset = offset.to_string();
            account.upsert(Server::Mirror, mirrored);
        }
        account.upsert(Server::Main, snipe);
        tracing::info!(item, bid, "snipe added");
        return format!("OK {item} ADDED");
    }

    if let Some(item) = param("ditemid") {
        if !account.remove(item) {
            return error(ERR_NOT_FOUND, &format!("no snipe for item {item}"));
        }
        tracing::info!(item, "snipe deleted");
        return format!("OK {item} DELETED");
    }

    for (key, server, label) in [
        ("listsnipesmain", Server::Main, "MAIN"),
        ("listsnipesmirror", Server::Mirror, "MIRROR"),
    ] {
        if param(key) == Some("1") {
            let mut body: String = account
                .snipes(server)
                .iter()
                .map(|s| s.to_line() + "\n")
                .collect();
            body.push_str(&format!("{br}OK {label} LISTED\n"));
            return body;
        }
    }

    if param("purgecompleted") == Some("1") {
        let purged = account.purge();
        tracing::info!(purged, "completed snipes purged");
        return format!("OK COMPLETED SNIPES PURGED{br}");
    }

    error(ERR_UNKNOWN_COMMAND, "unknown command")
}
