//! # Wire Protocol
//!
//! Newline-terminated UTF-8 text lines, whitespace-tokenized.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Store Wire Protocol                                │
//! │                                                                         │
//! │  GREETING                                                              │
//! │  ────────                                                              │
//! │  server ───► OK WELCOME                                                │
//! │                                                                         │
//! │  AUTH                                                                  │
//! │  ────                                                                  │
//! │  client ───► LOGIN <user> <pass> <role>                                │
//! │  server ◄─── OK LOGIN | ERR LOGIN INVALID_CREDENTIALS                  │
//! │            | ERR LOGIN ALREADY_CONNECTED                               │
//! │  client ───► LOGOUT                                                    │
//! │  server ◄─── OK BYE              (connection closes)                   │
//! │                                                                         │
//! │  INVENTORY                                                             │
//! │  ─────────                                                             │
//! │  client ───► LIST <branch>                                             │
//! │  server ◄─── ITEM sku,category,BRANCH,qty,price  (per product)         │
//! │  server ◄─── OK END                                                    │
//! │  client ───► BUY <branch> <sku> <qty>                                  │
//! │  server ◄─── OK BUY                                                    │
//! │                                                                         │
//! │  SALES                                                                 │
//! │  ─────                                                                 │
//! │  client ───► SELL <branch> <sku> <qty> <customerId>                    │
//! │  client ───► SELL_MULTI <branch> <customerId> <sku:qty,sku:qty,...>    │
//! │  server ◄─── OK SALE_MULTI <TIER> <base> <disc> <final>[ GIFT]         │
//! │  server ◄─── LINE <sku> <CAT> <qty> <unit> <base> <disc> <final>       │
//! │  server ◄─── GIFT_SHIRT 1 | GIFT_SHIRT_OUT_OF_STOCK                    │
//! │  server ◄─── OK END                                                    │
//! │                                                                         │
//! │  CUSTOMERS                                                             │
//! │  ─────────                                                             │
//! │  client ───► CUSTOMER_ADD <id> <fullName_underscored> <phone> [tier]   │
//! │  client ───► CUSTOMER_LIST                                             │
//! │  server ◄─── CUST id,fullName,phone,TIER  (per customer)               │
//! │  server ◄─── OK END                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Space-separated response fields never contain spaces: multi-word
//! values (category in `LINE`, name in `CUSTOMER_ADD`) travel with
//! underscores instead.

use store_core::sale::MAX_LINE_QTY;
use store_core::{Customer, LineBreakdown, Money, Product, Tier};

// =============================================================================
// Commands
// =============================================================================

/// One parsed request line. Branch and customer tokens stay raw here;
/// the handler resolves them so it can answer with the right error
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        username: String,
        password: String,
        role: String,
    },
    Logout,
    List {
        branch: String,
    },
    Buy {
        branch: String,
        sku: String,
        qty: i64,
    },
    Sell {
        branch: String,
        sku: String,
        qty: i64,
        customer_id: String,
    },
    SellMulti {
        branch: String,
        customer_id: String,
        spec: String,
    },
    CustomerAdd {
        id: String,
        full_name: String,
        phone: String,
        tier: Option<String>,
    },
    CustomerList,
}

/// Request-line parse failure, carrying its wire reason token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Wrong argument count for a known command.
    BadArgs,
    /// Quantity token is not a positive integer.
    BadQty,
    /// First token is not a known command.
    UnknownCommand,
}

impl ParseError {
    /// The `ERR <token>` line this failure answers with.
    pub fn wire_line(&self) -> &'static str {
        match self {
            ParseError::BadArgs => "ERR BAD_ARGS",
            ParseError::BadQty => "ERR BAD_QTY",
            ParseError::UnknownCommand => "ERR UNKNOWN_CMD",
        }
    }
}

/// Parses one request line. Blank lines parse to `None` and are
/// ignored by the handler. The command token is case-insensitive;
/// arguments are taken verbatim.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_uppercase().as_str() {
        "LOGIN" => {
            let [username, password, role] = take_args(args)?;
            Command::Login {
                username: username.to_string(),
                password: password.to_string(),
                role: role.to_string(),
            }
        }
        "LOGOUT" => Command::Logout,
        "LIST" => {
            let [branch] = take_args(args)?;
            Command::List {
                branch: branch.to_string(),
            }
        }
        "BUY" => {
            let [branch, sku, qty] = take_args(args)?;
            Command::Buy {
                branch: branch.to_string(),
                sku: sku.to_string(),
                qty: parse_qty(qty)?,
            }
        }
        "SELL" => {
            let [branch, sku, qty, customer_id] = take_args(args)?;
            Command::Sell {
                branch: branch.to_string(),
                sku: sku.to_string(),
                qty: parse_qty(qty)?,
                customer_id: customer_id.to_string(),
            }
        }
        "SELL_MULTI" => {
            let [branch, customer_id, spec] = take_args(args)?;
            Command::SellMulti {
                branch: branch.to_string(),
                customer_id: customer_id.to_string(),
                spec: spec.to_string(),
            }
        }
        "CUSTOMER_ADD" => {
            if args.len() < 3 || args.len() > 4 {
                return Err(ParseError::BadArgs);
            }
            Command::CustomerAdd {
                id: args[0].to_string(),
                full_name: args[1].replace('_', " "),
                phone: args[2].to_string(),
                tier: args.get(3).map(|t| t.to_string()),
            }
        }
        "CUSTOMER_LIST" => Command::CustomerList,
        _ => return Err(ParseError::UnknownCommand),
    };
    Ok(Some(command))
}

/// Exactly N arguments, or `BadArgs`.
fn take_args<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], ParseError> {
    <[&'a str; N]>::try_from(args).map_err(|_| ParseError::BadArgs)
}

// Same bound as cart-spec quantities: keeps qty × price inside the
// i64 cents range before any money math runs.
fn parse_qty(token: &str) -> Result<i64, ParseError> {
    match token.parse::<i64>() {
        Ok(qty) if qty > 0 && qty <= MAX_LINE_QTY => Ok(qty),
        _ => Err(ParseError::BadQty),
    }
}

// =============================================================================
// Response Rendering
// =============================================================================

pub const GREETING: &str = "OK WELCOME";
pub const OK_LOGIN: &str = "OK LOGIN";
pub const OK_BYE: &str = "OK BYE";
pub const OK_BUY: &str = "OK BUY";
pub const OK_END: &str = "OK END";
pub const OK_CUSTOMER_ADDED: &str = "OK CUSTOMER_ADDED";
pub const ERR_NOT_LOGGED_IN: &str = "ERR NOT_LOGGED_IN";
pub const ERR_INTERNAL: &str = "ERR INTERNAL";
pub const GIFT_GRANTED: &str = "GIFT_SHIRT 1";
pub const GIFT_OUT_OF_STOCK: &str = "GIFT_SHIRT_OUT_OF_STOCK";

/// `ITEM sku,category,BRANCH,qty,price` - the table row format, so a
/// `LIST` dump can reseed a data file verbatim.
pub fn item_line(p: &Product) -> String {
    format!(
        "ITEM {},{},{},{},{}",
        p.sku, p.category, p.branch, p.quantity, p.price
    )
}

/// `CUST id,fullName,phone,TIER`
pub fn cust_line(c: &Customer) -> String {
    format!("CUST {},{},{},{}", c.id, c.full_name, c.phone, c.tier.code())
}

/// `OK SALE <TIER> <base> <disc> <final>` header for a single-line sale.
pub fn sale_header(tier: Tier, base: Money, discount: Money, final_total: Money) -> String {
    format!("OK SALE {} {base} {discount} {final_total}", tier.code())
}

/// `OK SALE_MULTI <TIER> <base> <disc> <final>[ GIFT]` header for a cart.
///
/// The flag appears only when the gift unit was actually granted; an
/// eligible-but-out-of-stock gift is reported by the status line alone.
pub fn sale_multi_header(
    tier: Tier,
    base: Money,
    discount: Money,
    final_total: Money,
    gift_granted: bool,
) -> String {
    let mut header = format!("OK SALE_MULTI {} {base} {discount} {final_total}", tier.code());
    if gift_granted {
        header.push_str(" GIFT");
    }
    header
}

/// `LINE <sku> <CATEGORY> <qty> <unit> <lineBase> <lineDisc> <lineFinal>`
pub fn breakdown_line(line: &LineBreakdown) -> String {
    format!(
        "LINE {} {} {} {} {} {} {}",
        line.sku,
        underscored(&line.category),
        line.qty,
        line.unit_price,
        line.base,
        line.discount,
        line.final_total
    )
}

/// Spaces become underscores so the value stays one wire token.
pub fn underscored(value: &str) -> String {
    value.replace(' ', "_")
}

// =============================================================================
// Unit Tests
// =============================================================================
