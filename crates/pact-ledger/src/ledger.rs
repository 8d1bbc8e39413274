//! # Escrow Ledger
//!
//! [`EscrowLedger`] owns every [`Order`] and the escrow's custody account
//! inside an injected [`ValueLedger`]. Mutation goes through the five
//! operations below, each taking the caller's address explicitly.
//!
//! ## Check order
//!
//! Every operation validates in the same order: order existence, order
//! status, caller authorization, deposit amount, and finally custody
//! movement. The first failing check is the error returned. Nothing is
//! written (no order, no balance, no event, no id) until every check has
//! passed and the value ledger has accepted the transfer.

use std::collections::BTreeMap;

use chrono::Utc;

use pact_core::{Address, Amount, OrderId};

use crate::custody::{CustodyError, CustodyReport, InMemoryBank, Transfer, ValueLedger};
use crate::error::EscrowError;
use crate::event::{EscrowEvent, EventLog, EventRecord};
use crate::order::{Operation, Order, OrderStatus};
use crate::policy::{CancellationPolicy, EscrowPolicy};

/// The escrow: a keyed collection of order state machines plus custody.
#[derive(Debug, Clone)]
pub struct EscrowLedger<V> {
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) next_id: OrderId,
    pub(crate) custody: Address,
    pub(crate) policy: EscrowPolicy,
    pub(crate) events: EventLog,
    pub(crate) bank: V,
}

impl<V: ValueLedger> EscrowLedger<V> {
    /// An empty ledger holding custody in `custody` within `bank`.
    pub fn new(bank: V, custody: Address, policy: EscrowPolicy) -> Self {
        Self {
            orders: BTreeMap::new(),
            next_id: OrderId::FIRST,
            custody,
            policy,
            events: EventLog::new(),
            bank,
        }
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Open a new order, locking `deposit` from `caller` as the seller's
    /// collateral.
    ///
    /// `deposit` must be exactly twice `amount`. Emits
    /// [`EscrowEvent::OrderCreated`].
    pub fn create_order(
        &mut self,
        caller: &Address,
        description: impl Into<String>,
        amount: Amount,
        deposit: Amount,
    ) -> Result<OrderId, EscrowError> {
        self.try_create_order(caller, description.into(), amount, deposit)
            .map_err(|e| rejected(Operation::CreateOrder, None, e))
    }

    /// Lock the buyer's matching collateral; the caller becomes the buyer.
    ///
    /// Emits [`EscrowEvent::PurchaseConfirmed`].
    pub fn confirm_purchase(
        &mut self,
        caller: &Address,
        id: OrderId,
        deposit: Amount,
    ) -> Result<(), EscrowError> {
        self.try_confirm_purchase(caller, id, deposit)
            .map_err(|e| rejected(Operation::ConfirmPurchase, Some(id), e))
    }

    /// The buyer attests receipt; their deposit is paid back.
    ///
    /// Emits [`EscrowEvent::BuyerRefunded`].
    pub fn confirm_received(&mut self, caller: &Address, id: OrderId) -> Result<(), EscrowError> {
        self.try_confirm_received(caller, id)
            .map_err(|e| rejected(Operation::ConfirmReceived, Some(id), e))
    }

    /// Pay the seller's deposit back after receipt, completing the order.
    ///
    /// Emits [`EscrowEvent::SellerDepositReleased`].
    pub fn release_seller_deposit(
        &mut self,
        caller: &Address,
        id: OrderId,
    ) -> Result<(), EscrowError> {
        self.try_release_seller_deposit(caller, id)
            .map_err(|e| rejected(Operation::ReleaseSellerDeposit, Some(id), e))
    }

    /// Cancel a locked order, refunding the buyer.
    ///
    /// Emits [`EscrowEvent::BuyerRefunded`]. Under the default
    /// [`CancellationPolicy::ReturnToSeller`] the seller's deposit is paid
    /// back in the same call and [`EscrowEvent::SellerDepositReleased`]
    /// follows; [`CancellationPolicy::RetainInCustody`] emits the refund
    /// alone.
    pub fn refund_buyer(&mut self, caller: &Address, id: OrderId) -> Result<(), EscrowError> {
        self.try_refund_buyer(caller, id)
            .map_err(|e| rejected(Operation::RefundBuyer, Some(id), e))
    }

    fn try_create_order(
        &mut self,
        caller: &Address,
        description: String,
        amount: Amount,
        deposit: Amount,
    ) -> Result<OrderId, EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount {
                amount,
                reason: "amount must be greater than zero",
            });
        }
        let required = Order::required_deposit_for(amount).ok_or(EscrowError::InvalidAmount {
            amount,
            reason: "required deposit overflows",
        })?;
        if deposit != required {
            return Err(EscrowError::DepositMismatch {
                operation: Operation::CreateOrder,
                expected: required,
                actual: deposit,
            });
        }
        self.ensure_not_custody(caller)?;

        let id = self.next_id;
        let following = id.next()?;
        self.bank.transfer(caller, &self.custody, deposit)?;

        let now = Utc::now();
        self.orders.insert(
            id,
            Order {
                id,
                description: description.clone(),
                amount,
                seller: caller.clone(),
                seller_deposit: deposit,
                buyer: None,
                buyer_deposit: Amount::ZERO,
                status: OrderStatus::Created,
                held: deposit,
                created_at: now,
                updated_at: now,
            },
        );
        self.next_id = following;
        self.emit(EscrowEvent::OrderCreated {
            id,
            description,
            amount,
            seller_deposit: deposit,
        });
        Ok(id)
    }

    fn try_confirm_purchase(
        &mut self,
        caller: &Address,
        id: OrderId,
        deposit: Amount,
    ) -> Result<(), EscrowError> {
        let order = self.require(id, Operation::ConfirmPurchase)?;
        let required = order.seller_deposit;
        if deposit != required {
            return Err(EscrowError::DepositMismatch {
                operation: Operation::ConfirmPurchase,
                expected: required,
                actual: deposit,
            });
        }
        let held = order
            .held
            .checked_add(deposit)
            .ok_or_else(|| CustodyError::Overflow {
                account: self.custody.clone(),
            })?;
        self.ensure_not_custody(caller)?;

        self.bank.transfer(caller, &self.custody, deposit)?;

        let order = self.order_mut(id)?;
        order.buyer = Some(caller.clone());
        order.buyer_deposit = deposit;
        order.held = held;
        order.advance(Operation::ConfirmPurchase.target_status());
        self.emit(EscrowEvent::PurchaseConfirmed {
            id,
            buyer: caller.clone(),
            buyer_deposit: deposit,
        });
        Ok(())
    }

    fn try_confirm_received(&mut self, caller: &Address, id: OrderId) -> Result<(), EscrowError> {
        let order = self.require(id, Operation::ConfirmReceived)?;
        let buyer = match &order.buyer {
            Some(buyer) if buyer == caller => buyer.clone(),
            _ => {
                return Err(EscrowError::Unauthorized {
                    order_id: id,
                    operation: Operation::ConfirmReceived,
                    caller: caller.clone(),
                })
            }
        };
        let payout = order.buyer_deposit;
        let held = remaining_after(order, payout)?;

        self.bank.transfer(&self.custody, &buyer, payout)?;

        let order = self.order_mut(id)?;
        order.held = held;
        order.advance(Operation::ConfirmReceived.target_status());
        self.emit(EscrowEvent::BuyerRefunded {
            id,
            buyer_deposit: payout,
        });
        Ok(())
    }

    fn try_release_seller_deposit(
        &mut self,
        caller: &Address,
        id: OrderId,
    ) -> Result<(), EscrowError> {
        let order = self.require(id, Operation::ReleaseSellerDeposit)?;
        self.authorize(
            order,
            caller,
            Operation::ReleaseSellerDeposit,
            self.policy.release_authority.permits(&order.seller == caller),
        )?;
        let seller = order.seller.clone();
        let payout = order.seller_deposit;
        let held = remaining_after(order, payout)?;

        self.bank.transfer(&self.custody, &seller, payout)?;

        let order = self.order_mut(id)?;
        order.held = held;
        order.advance(Operation::ReleaseSellerDeposit.target_status());
        self.emit(EscrowEvent::SellerDepositReleased {
            id,
            seller_deposit: payout,
        });
        Ok(())
    }

    fn try_refund_buyer(&mut self, caller: &Address, id: OrderId) -> Result<(), EscrowError> {
        let order = self.require(id, Operation::RefundBuyer)?;
        self.authorize(
            order,
            caller,
            Operation::RefundBuyer,
            self.policy.refund_authority.permits(&order.seller == caller),
        )?;
        let buyer = order.buyer.clone().ok_or(EscrowError::InvalidState {
            order_id: id,
            operation: Operation::RefundBuyer,
            status: order.status,
        })?;
        let return_seller = self.policy.cancellation == CancellationPolicy::ReturnToSeller;

        let mut legs = vec![Transfer::new(
            self.custody.clone(),
            buyer,
            order.buyer_deposit,
        )];
        if return_seller {
            legs.push(Transfer::new(
                self.custody.clone(),
                order.seller.clone(),
                order.seller_deposit,
            ));
        }
        let total = legs
            .iter()
            .try_fold(Amount::ZERO, |acc, leg| acc.checked_add(leg.amount))
            .ok_or_else(|| CustodyError::Overflow {
                account: self.custody.clone(),
            })?;
        let held = remaining_after(order, total)?;
        let (buyer_deposit, seller_deposit) = (order.buyer_deposit, order.seller_deposit);

        self.bank.transfer_batch(&legs)?;

        let order = self.order_mut(id)?;
        order.held = held;
        order.advance(Operation::RefundBuyer.target_status());
        self.emit(EscrowEvent::BuyerRefunded { id, buyer_deposit });
        if return_seller {
            self.emit(EscrowEvent::SellerDepositReleased { id, seller_deposit });
        }
        Ok(())
    }

    // ── Checks ──────────────────────────────────────────────────────────

    /// Existence, then status: the order must sit at the operation's
    /// source status and the move must be an edge of the lifecycle graph.
    fn require(&self, id: OrderId, operation: Operation) -> Result<&Order, EscrowError> {
        let order = self.orders.get(&id).ok_or(EscrowError::OrderNotFound(id))?;
        let on_graph = operation.required_status() == Some(order.status)
            && order.status.can_transition_to(operation.target_status());
        if !on_graph {
            return Err(EscrowError::InvalidState {
                order_id: id,
                operation,
                status: order.status,
            });
        }
        Ok(order)
    }

    fn authorize(
        &self,
        order: &Order,
        caller: &Address,
        operation: Operation,
        permitted: bool,
    ) -> Result<(), EscrowError> {
        if permitted {
            return Ok(());
        }
        Err(EscrowError::Unauthorized {
            order_id: order.id,
            operation,
            caller: caller.clone(),
        })
    }

    fn ensure_not_custody(&self, caller: &Address) -> Result<(), CustodyError> {
        if caller == &self.custody {
            return Err(CustodyError::ReservedAccount(caller.clone()));
        }
        Ok(())
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut Order, EscrowError> {
        self.orders.get_mut(&id).ok_or(EscrowError::OrderNotFound(id))
    }

    fn emit(&mut self, event: EscrowEvent) {
        let record = self.events.push(event);
        tracing::info!(
            sequence = record.sequence,
            order_id = %record.event.order_id(),
            event = record.event.name(),
            "{}",
            record.event
        );
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Look up an order.
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Look up an order, failing with [`EscrowError::OrderNotFound`].
    pub fn order(&self, id: OrderId) -> Result<&Order, EscrowError> {
        self.get_order(id).ok_or(EscrowError::OrderNotFound(id))
    }

    /// All orders in id order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Orders in id order, optionally only those in `status` and those
    /// where `party` is the seller or the buyer.
    pub fn orders_matching<'a>(
        &'a self,
        status: Option<OrderStatus>,
        party: Option<&'a Address>,
    ) -> impl Iterator<Item = &'a Order> {
        self.orders
            .values()
            .filter(move |o| status.map_or(true, |s| o.status == s))
            .filter(move |o| party.map_or(true, |p| o.is_party(p)))
    }

    /// Number of orders ever created.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// The id the next successful `create_order` will assign.
    pub fn next_order_id(&self) -> OrderId {
        self.next_id
    }

    /// Every notification, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Notifications with a sequence greater than `sequence`.
    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        self.events.since(sequence)
    }

    /// Sequence of the newest notification; 0 if none.
    pub fn last_event_sequence(&self) -> u64 {
        self.events.last_sequence()
    }

    /// The escrow rules.
    pub fn policy(&self) -> &EscrowPolicy {
        &self.policy
    }

    /// The escrow's own account in the value ledger.
    pub fn custody_account(&self) -> &Address {
        &self.custody
    }

    /// The injected value ledger.
    pub fn bank(&self) -> &V {
        &self.bank
    }

    /// Balance of `account` in the value ledger.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.bank.balance_of(account)
    }

    /// Sum of `held` across all orders.
    pub fn total_held(&self) -> Result<Amount, CustodyError> {
        self.orders
            .values()
            .try_fold(Amount::ZERO, |acc, o| acc.checked_add(o.held))
            .ok_or_else(|| CustodyError::Overflow {
                account: self.custody.clone(),
            })
    }

    /// Check the custody balance equals what the orders hold.
    pub fn verify_custody(&self) -> Result<CustodyReport, CustodyError> {
        let total_held = self.total_held()?;
        let custody_balance = self.bank.balance_of(&self.custody);
        if custody_balance != total_held {
            return Err(CustodyError::CustodyMismatch {
                expected: total_held,
                actual: custody_balance,
            });
        }
        Ok(CustodyReport {
            custody_account: self.custody.clone(),
            custody_balance,
            total_held,
            open_orders: self.orders.values().filter(|o| !o.is_terminal()).count(),
        })
    }
}

impl EscrowLedger<InMemoryBank> {
    /// Fund `account` with new value. The custody account cannot be funded.
    pub fn mint(&mut self, account: &Address, amount: Amount) -> Result<(), EscrowError> {
        self.ensure_not_custody(account)?;
        self.bank.mint(account, amount)?;
        tracing::debug!(account = %account, amount = %amount, "minted");
        Ok(())
    }
}

/// `held` after paying `payout` out of `order`.
fn remaining_after(order: &Order, payout: Amount) -> Result<Amount, CustodyError> {
    order
        .held
        .checked_sub(payout)
        .ok_or(CustodyError::InsufficientHeld {
            order_id: order.id,
            requested: payout,
            held: order.held,
        })
}

fn rejected(operation: Operation, order_id: Option<OrderId>, err: EscrowError) -> EscrowError {
    tracing::debug!(
        %operation,
        order_id = order_id.map(|id| id.get()),
        kind = %err.kind(),
        error = %err,
        "operation rejected"
    );
    err
}
