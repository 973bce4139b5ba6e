//! Simulated users
//!
//! A [`User`] keeps the latest snapshot of every order it has placed and the
//! latest current market of every symbol it subscribes to. Users are shared
//! with the market publisher through `Arc`, so both maps sit behind locks.

use matching_engine::{CurrentMarketObserver, CurrentMarketSide};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use types::errors::{EngineError, OrderError};
use types::ids::{OrderId, Symbol, UserId};
use types::order::OrderSnapshot;

type Market = (CurrentMarketSide, CurrentMarketSide);

pub struct User {
    user_id: UserId,
    orders: Mutex<HashMap<OrderId, OrderSnapshot>>,
    markets: Mutex<BTreeMap<Symbol, Market>>,
}

impl User {
    pub fn new(user: &str) -> Result<Self, OrderError> {
        Ok(Self {
            user_id: UserId::try_new(user)?,
            orders: Mutex::new(HashMap::new()),
            markets: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Record or replace the snapshot for an order
    pub fn add_order(&self, snapshot: OrderSnapshot) {
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        orders.insert(snapshot.order_id, snapshot);
    }

    pub fn order(&self, order_id: &OrderId) -> Option<OrderSnapshot> {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        orders.get(order_id).cloned()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn has_order_with_remaining(&self) -> bool {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        orders.values().any(|order| order.remaining_volume > 0)
    }

    /// Oldest order that still has volume on the book
    pub fn order_with_remaining(&self) -> Option<OrderSnapshot> {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        orders
            .values()
            .filter(|order| order.remaining_volume > 0)
            .min_by_key(|order| (order.created_at, order.order_id))
            .cloned()
    }

    /// Latest (buy, sell) market seen for `symbol`
    pub fn current_market(&self, symbol: &Symbol) -> Option<Market> {
        let markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
        markets.get(symbol).copied()
    }

    /// One line per subscribed symbol: "WMT $140.95x50 - $141.00x25"
    pub fn current_markets(&self) -> String {
        let markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
        markets
            .iter()
            .map(|(symbol, (buy, sell))| format!("\n\t{} {} - {}", symbol, buy, sell))
            .collect()
    }
}

impl CurrentMarketObserver for User {
    fn update_current_market(&self, symbol: &Symbol, buy: &CurrentMarketSide, sell: &CurrentMarketSide) {
        let mut markets = self.markets.lock().unwrap_or_else(PoisonError::into_inner);
        markets.insert(symbol.clone(), (*buy, *sell));
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User Id: {}", self.user_id)?;
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sorted: Vec<&OrderSnapshot> = orders.values().collect();
        sorted.sort_by_key(|order| (order.created_at, order.order_id));
        for order in sorted {
            write!(f, "\n\t{}", order)?;
        }
        Ok(())
    }
}

/// All users taking part in a simulation, keyed by id
#[derive(Default)]
pub struct UserRegistry {
    users: BTreeMap<UserId, Arc<User>>,
}

impl UserRegistry {
    /// Create one user per id; fails on the first invalid or repeated id
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<Self, EngineError> {
        let mut users = BTreeMap::new();
        for id in ids {
            let user = User::new(id)?;
            if users.contains_key(user.user_id()) {
                return Err(EngineError::DuplicateUser {
                    user: user.user_id().to_string(),
                });
            }
            users.insert(user.user_id().clone(), Arc::new(user));
        }
        Ok(Self { users })
    }

    /// Look up a user by (unnormalized) id
    pub fn get(&self, user: &str) -> Option<&Arc<User>> {
        let user_id = UserId::try_new(user).ok()?;
        self.users.get(&user_id)
    }

    /// Registered ids, sorted
    pub fn user_ids(&self) -> Vec<&UserId> {
        self.users.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Uniformly pick a user; `None` when the registry is empty
    pub fn random_user<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<User>> {
        let users: Vec<&Arc<User>> = self.users.values().collect();
        users.choose(rng).copied()
    }

    /// Record a snapshot on the user that owns it
    pub fn add_to_user(&self, user_id: &UserId, snapshot: OrderSnapshot) -> Result<(), EngineError> {
        let user = self.users.get(user_id).ok_or_else(|| EngineError::UnknownUser {
            user: user_id.to_string(),
        })?;
        user.add_order(snapshot);
        Ok(())
    }
}

impl fmt::Display for UserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Users:")?;
        if self.users.is_empty() {
            return writeln!(f, " <Empty>");
        }
        for user in self.users.values() {
            write!(f, "\n\n{}", user)?;
        }
        Ok(())
    }
}
