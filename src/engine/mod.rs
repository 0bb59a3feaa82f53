//! Core engine: session setup and the stateless services that drive it.
//!
//! - `store`: packs and protection supplies
//! - `day`: the daily tick (market, grading, rotation)
//!
//! `Session` bundles the catalog, the mutable `GameState`, the market engine
//! and the random source so callers have one handle per game.

pub mod day;
pub mod store;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::grading::{GradingEngine, GradingSubmission, ServiceTier};
use crate::inventory;
use crate::inventory::shared::SharedCollections;
use crate::market::MarketEngine;
use crate::random::{RandomSource, SeededRandom};
use crate::state::GameState;
use crate::trading::negotiation::{BundleOffer, Negotiation, NegotiationTurn};
use crate::trading::offers::{self, AiOffer};
use crate::trading::{self, TradeRecord};
use crate::types::{GameError, InstanceId, Money, OwnerId, TraderId};

use self::day::{DayCycle, DayReport};
use self::store::{PackReveal, Store, SupplyKind};

/// Build a fresh game: starting cash and supplies, starter cards and the
/// trader roster.
pub fn new_game(
    config: &AppConfig,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
) -> Result<GameState, GameError> {
    let session = &config.session;
    let mut state = GameState::new(session.starting_cash, session.days_per_year);
    state.player.supplies.sleeves = session.starting_sleeves;
    state.player.supplies.toploaders = session.starting_toploaders;

    let today = state.today();
    for card_id in &session.starter_cards {
        let card = catalog.require_card(card_id)?;
        inventory::add(&mut state, OwnerId::Player, card, today, rng)?;
        state.stats.cards_acquired += 1;
    }

    state.traders = trading::generate_roster(catalog, &config.roster_config(), today, rng);

    info!(
        cash = format!("${:.2}", state.player.cash),
        cards = state.player.collection.count_all(),
        traders = state.traders.len(),
        "New game created"
    );
    Ok(state)
}

/// One running game.
pub struct Session {
    pub catalog: Catalog,
    pub state: GameState,
    market: MarketEngine,
    rng: Box<dyn RandomSource + Send>,
    enforce_round_cap: bool,
    /// Present while the accounts are shared with other threads.
    shared: Option<SharedCollections>,
}

impl Session {
    /// Start a new game with the built-in catalog.
    pub fn new(config: &AppConfig) -> Result<Self, GameError> {
        let catalog = Catalog::builtin();
        let mut rng = SeededRandom::from_optional_seed(config.session.seed);
        let state = new_game(config, &catalog, &mut rng)?;
        Ok(Self::assemble(config, catalog, state, Box::new(rng)))
    }

    /// Continue from a restored state. The catalog is rebuilt, never
    /// persisted.
    pub fn resume(config: &AppConfig, state: GameState) -> Self {
        let catalog = Catalog::builtin();
        let rng = SeededRandom::from_optional_seed(config.session.seed);
        Self::assemble(config, catalog, state, Box::new(rng))
    }

    /// Build a session around an explicit random source.
    pub fn with_rng(
        config: &AppConfig,
        catalog: Catalog,
        state: GameState,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        Self::assemble(config, catalog, state, rng)
    }

    fn assemble(
        config: &AppConfig,
        catalog: Catalog,
        state: GameState,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        Self {
            catalog,
            state,
            market: MarketEngine::new(config.market_config()),
            rng,
            enforce_round_cap: config.trading.enforce_round_cap,
            shared: None,
        }
    }

    // -- Shared accounts ----------------------------------------------------

    /// Put the player's and every trader's cards and cash behind locks that
    /// other threads can use through the returned handle.
    ///
    /// Until `unshare`, every session operation that moves the player's
    /// cards or cash does so under the player's lock, and trades lock both
    /// sides. Calling it again returns the same handle.
    pub fn share(&mut self) -> SharedCollections {
        if let Some(shared) = &self.shared {
            return shared.clone();
        }
        let shared = SharedCollections::from_state(&self.state);
        info!(traders = self.state.traders.len(), "Accounts shared");
        self.shared = Some(shared.clone());
        shared
    }

    /// Stop sharing and copy every account back into `state`.
    pub fn unshare(&mut self) -> Result<(), GameError> {
        if let Some(shared) = &self.shared {
            shared.write_back(&mut self.state)?;
            self.shared = None;
            info!("Accounts no longer shared");
        }
        Ok(())
    }

    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Bring `state` up to date with the shared accounts.
    fn refresh(&mut self) -> Result<(), GameError> {
        match &self.shared {
            Some(shared) => shared.write_back(&mut self.state),
            None => Ok(()),
        }
    }

    /// Run an operation that only touches the player's side. While shared,
    /// the player's account stays locked from the moment it is copied into
    /// `state` until the result is copied back.
    fn with_player<T>(
        &mut self,
        op: impl FnOnce(&mut GameState, &Catalog, &MarketEngine, &mut dyn RandomSource) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let Session {
            catalog,
            state,
            market,
            rng,
            shared,
            ..
        } = self;
        let Some(shared) = shared else {
            return op(state, catalog, market, rng.as_mut());
        };
        shared.with_account(OwnerId::Player, |account| {
            state.player.collection = account.inventory.clone();
            state.player.cash = account.cash;
            let result = op(state, catalog, market, rng.as_mut());
            account.inventory = state.player.collection.clone();
            account.cash = state.player.cash;
            result
        })?
    }

    // -- Player operations --------------------------------------------------

    pub fn advance_day(&mut self) -> Result<DayReport, GameError> {
        self.with_player(|state, catalog, market, rng| {
            Ok(DayCycle::advance(state, catalog, market, rng))
        })
    }

    pub fn buy_pack(&mut self, set_id: &str) -> Result<Money, GameError> {
        self.with_player(|state, catalog, _, _| Store::buy_pack(state, catalog, set_id))
    }

    pub fn open_pack(&mut self, set_id: &str) -> Result<PackReveal, GameError> {
        Store::open_pack(&mut self.state, &self.catalog, set_id, self.rng.as_mut())
    }

    /// Put revealed cards into the collection.
    pub fn commit(&mut self, reveal: PackReveal) -> Result<Vec<InstanceId>, GameError> {
        self.with_player(|state, _, _, _| Ok(reveal.commit(state)))
    }

    /// Open a pack and put its cards straight into the collection.
    pub fn open_and_commit(&mut self, set_id: &str) -> Result<Vec<InstanceId>, GameError> {
        self.with_player(|state, catalog, _, rng| {
            let reveal = Store::open_pack(state, catalog, set_id, rng)?;
            Ok(reveal.commit(state))
        })
    }

    pub fn buy_supplies(&mut self, kind: SupplyKind, amount: u32, price: Money) -> Result<(), GameError> {
        self.with_player(|state, _, _, _| Store::buy_supplies(state, kind, amount, price))
    }

    pub fn protect(&mut self, instance: InstanceId, kind: SupplyKind) -> Result<(), GameError> {
        self.with_player(|state, _, _, _| Store::protect(state, instance, kind))
    }

    pub fn unprotect(&mut self, instance: InstanceId, kind: SupplyKind) -> Result<(), GameError> {
        self.with_player(|state, _, _, _| Store::unprotect(state, instance, kind))
    }

    pub fn submit_for_grading(
        &mut self,
        service: ServiceTier,
        instances: &[InstanceId],
    ) -> Result<GradingSubmission, GameError> {
        self.with_player(|state, catalog, _, _| GradingEngine::submit(state, catalog, service, instances))
    }

    // -- Trading ------------------------------------------------------------

    pub fn solicit_offers(&mut self) -> Result<Vec<AiOffer>, GameError> {
        self.refresh()?;
        Ok(offers::solicit_offers(&self.state, &self.catalog, self.rng.as_mut()))
    }

    pub fn accept_offer(&mut self, offer: &AiOffer) -> Result<TradeRecord, GameError> {
        self.refresh()?;
        offers::complete_sale_on(
            &mut self.state,
            &self.catalog,
            self.shared.as_ref(),
            offer.trader,
            offer.instance,
            offer.amount,
        )
    }

    /// Open a bundle negotiation with `trader`.
    pub fn negotiate(&self, trader: TraderId) -> Result<Negotiation, GameError> {
        self.state.trader(trader)?;
        Ok(Negotiation::open(trader, self.enforce_round_cap))
    }

    /// Propose a bundle within an open negotiation.
    pub fn propose(
        &mut self,
        negotiation: &mut Negotiation,
        offer: &BundleOffer,
    ) -> Result<NegotiationTurn, GameError> {
        self.refresh()?;
        negotiation.propose_on(
            &mut self.state,
            &self.catalog,
            self.shared.as_ref(),
            offer,
            self.rng.as_mut(),
        )
    }

    /// Take the counter-offer on the table in `negotiation`.
    pub fn accept_counter(&mut self, negotiation: &mut Negotiation) -> Result<TradeRecord, GameError> {
        self.refresh()?;
        negotiation.accept_counter_on(&mut self.state, &self.catalog, self.shared.as_ref())
    }

    pub fn collection_value(&self) -> Money {
        match self.shared.as_ref().and_then(|s| s.snapshot(OwnerId::Player).ok()) {
            Some(collection) => collection.market_value(&self.catalog, &self.state.market.modifiers),
            None => self.state.collection_value(&self.catalog),
        }
    }

    /// Cash plus collection value.
    pub fn net_worth(&self) -> Money {
        let cash = self
            .shared
            .as_ref()
            .and_then(|s| s.cash(OwnerId::Player).ok())
            .unwrap_or(self.state.player.cash);
        cash + self.collection_value()
    }

    /// One unattended day: optionally buy and open the cheapest pack, take
    /// any AI offer at or above market value, then advance the clock.
    pub fn autoplay_day(&mut self, buy_packs: bool, accept_fair_offers: bool) -> Result<DayReport, GameError> {
        self.refresh()?;
        if buy_packs {
            self.autoplay_pack();
        }
        if accept_fair_offers {
            for offer in self.solicit_offers()? {
                if offer.amount < offer.market_value || offer.market_value <= Decimal::ZERO {
                    continue;
                }
                if let Err(e) = self.accept_offer(&offer) {
                    warn!(error = %e, trader = offer.trader, "Offer could not be completed");
                }
            }
        }
        self.advance_day()
    }

    fn autoplay_pack(&mut self) {
        let year = self.state.today().year;
        let cheapest = self
            .catalog
            .sets()
            .filter(|s| s.release_year <= year)
            .min_by_key(|s| s.pack_price)
            .map(|s| (s.id.clone(), s.pack_price));
        let Some((set_id, price)) = cheapest else { return };
        if self.state.player.cash < price {
            return;
        }
        let opened = self
            .buy_pack(&set_id)
            .and_then(|_| self.open_and_commit(&set_id));
        if let Err(e) = opened {
            warn!(error = %e, set = %set_id, "Autoplay pack failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
