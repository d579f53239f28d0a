// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallets, categories and transactions.
//!
//! Creation is batch-only and atomic: ids are assigned in submission order,
//! the whole list goes to the record store in one transaction, and the
//! stored rows come back in the same order. One bad item rejects the batch.

use chrono::Utc;
use uuid::Uuid;

use super::{Interactor, InteractorError, InteractorResult, Stage};
use crate::models::{
    Category, CategoryFields, Session, Transaction, TransactionFields, Wallet, WalletFields,
};
use crate::storage::{RecordKey, Records};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Interactor {
    // =========================================================================
    // Wallets
    // =========================================================================

    pub fn create_wallets(
        &self,
        session: &Session,
        wallets: Vec<WalletFields>,
    ) -> InteractorResult<Vec<Wallet>> {
        let now = Utc::now();
        let wallets: Vec<Wallet> = wallets
            .into_iter()
            .map(|fields| Wallet {
                wallet_id: new_id(),
                account_id: session.account_id.clone(),
                name: fields.name,
                description: fields.description,
                access_credential: fields
                    .access_secret
                    .as_deref()
                    .map(|secret| self.hasher.derive(secret)),
                created_at: now,
                updated_at: now,
            })
            .collect();

        let created = self
            .store
            .create_batch(wallets)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %session.account_id,
            count = created.len(),
            "wallets created"
        );
        Ok(created)
    }

    pub fn get_wallet(&self, session: &Session, wallet_id: &str) -> InteractorResult<Wallet> {
        self.store
            .get(&Wallet::key_for(&session.account_id, wallet_id))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    pub fn list_wallets(&self, session: &Session) -> InteractorResult<Vec<Wallet>> {
        self.store
            .list(&RecordKey::new([session.account_id.as_str()]))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    /// Replace a wallet's fields. The access credential is kept unless a new
    /// secret is supplied.
    pub fn update_wallet(
        &self,
        session: &Session,
        wallet_id: &str,
        fields: WalletFields,
    ) -> InteractorResult<Wallet> {
        let mut wallet = self.get_wallet(session, wallet_id)?;
        wallet.name = fields.name;
        wallet.description = fields.description;
        if let Some(secret) = fields.access_secret.as_deref() {
            wallet.access_credential = Some(self.hasher.derive(secret));
        }
        self.store
            .update(wallet)
            .map_err(InteractorError::store(Stage::PrimaryWrite))
    }

    /// Delete a wallet together with its transactions.
    pub fn delete_wallet(&self, session: &Session, wallet_id: &str) -> InteractorResult<()> {
        self.store
            .delete::<Wallet>(&Wallet::key_for(&session.account_id, wallet_id))
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %session.account_id,
            wallet_id = %wallet_id,
            "wallet deleted"
        );
        Ok(())
    }

    /// Whether `secret` opens the wallet. Wallets without an access secret
    /// are open to their owner.
    pub fn verify_wallet_access(
        &self,
        session: &Session,
        wallet_id: &str,
        secret: &str,
    ) -> InteractorResult<bool> {
        let wallet = self.get_wallet(session, wallet_id)?;
        Ok(match &wallet.access_credential {
            Some(credential) => self.sessions.authenticate(secret, credential),
            None => true,
        })
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Every category must point at an existing image of the same account.
    pub fn create_categories(
        &self,
        session: &Session,
        categories: Vec<CategoryFields>,
    ) -> InteractorResult<Vec<Category>> {
        let now = Utc::now();
        let categories: Vec<Category> = categories
            .into_iter()
            .map(|fields| Category {
                category_id: new_id(),
                account_id: session.account_id.clone(),
                image_id: fields.image_id,
                name: fields.name,
                description: fields.description,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let created = self
            .store
            .create_batch(categories)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %session.account_id,
            count = created.len(),
            "categories created"
        );
        Ok(created)
    }

    pub fn get_category(&self, session: &Session, category_id: &str) -> InteractorResult<Category> {
        self.store
            .get(&Category::key_for(&session.account_id, category_id))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    pub fn list_categories(&self, session: &Session) -> InteractorResult<Vec<Category>> {
        self.store
            .list(&RecordKey::new([session.account_id.as_str()]))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    pub fn update_category(
        &self,
        session: &Session,
        category_id: &str,
        fields: CategoryFields,
    ) -> InteractorResult<Category> {
        let now = Utc::now();
        let category = Category {
            category_id: category_id.to_string(),
            account_id: session.account_id.clone(),
            image_id: fields.image_id,
            name: fields.name,
            description: fields.description,
            created_at: now,
            updated_at: now,
        };
        self.store
            .update(category)
            .map_err(InteractorError::store(Stage::PrimaryWrite))
    }

    pub fn delete_category(&self, session: &Session, category_id: &str) -> InteractorResult<()> {
        self.store
            .delete::<Category>(&Category::key_for(&session.account_id, category_id))
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        Ok(())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Record a batch of transactions against one wallet.
    pub fn create_transactions(
        &self,
        session: &Session,
        wallet_id: &str,
        transactions: Vec<TransactionFields>,
    ) -> InteractorResult<Vec<Transaction>> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        // Unknown wallet is a lookup miss, not a constraint violation
        self.get_wallet(session, wallet_id)?;

        let now = Utc::now();
        let transactions: Vec<Transaction> = transactions
            .into_iter()
            .map(|fields| Transaction {
                transaction_id: new_id(),
                account_id: session.account_id.clone(),
                wallet_id: wallet_id.to_string(),
                category_id: fields.category_id,
                amount: fields.amount,
                description: fields.description,
                date: fields.date,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let created = self
            .store
            .create_batch(transactions)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(
            parent: &self.span,
            account_id = %session.account_id,
            wallet_id = %wallet_id,
            count = created.len(),
            "transactions created"
        );
        Ok(created)
    }

    pub fn get_transaction(
        &self,
        session: &Session,
        wallet_id: &str,
        transaction_id: &str,
    ) -> InteractorResult<Transaction> {
        self.store
            .get(&Transaction::key_for(
                &session.account_id,
                wallet_id,
                transaction_id,
            ))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    /// Transactions of the account, or of one wallet when `wallet_id` is set.
    pub fn list_transactions(
        &self,
        session: &Session,
        wallet_id: Option<&str>,
    ) -> InteractorResult<Vec<Transaction>> {
        let scope = match wallet_id {
            Some(wallet_id) => Wallet::key_for(&session.account_id, wallet_id),
            None => RecordKey::new([session.account_id.as_str()]),
        };
        self.store
            .list(&scope)
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    pub fn update_transaction(
        &self,
        session: &Session,
        wallet_id: &str,
        transaction_id: &str,
        fields: TransactionFields,
    ) -> InteractorResult<Transaction> {
        let now = Utc::now();
        let transaction = Transaction {
            transaction_id: transaction_id.to_string(),
            account_id: session.account_id.clone(),
            wallet_id: wallet_id.to_string(),
            category_id: fields.category_id,
            amount: fields.amount,
            description: fields.description,
            date: fields.date,
            created_at: now,
            updated_at: now,
        };
        self.store
            .update(transaction)
            .map_err(InteractorError::store(Stage::PrimaryWrite))
    }

    pub fn delete_transaction(
        &self,
        session: &Session,
        wallet_id: &str,
        transaction_id: &str,
    ) -> InteractorResult<()> {
        self.store
            .delete::<Transaction>(&Transaction::key_for(
                &session.account_id,
                wallet_id,
                transaction_id,
            ))
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::interactor::ErrorKind;
    use crate::models::ImageFields;
    use crate::storage::Record;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn wallet(name: &str) -> WalletFields {
        WalletFields {
            name: name.to_string(),
            description: String::new(),
            access_secret: None,
        }
    }

    fn icon(f: &Fixture, session: &Session) -> String {
        f.interactor
            .create_image(
                session,
                ImageFields {
                    name: "icon".to_string(),
                    description: String::new(),
                    url: None,
                    file_name: "icon.png".to_string(),
                    format: "png".to_string(),
                    raw_image: vec![0x89, 0x50],
                },
            )
            .unwrap()
            .image_id
    }

    fn category(image_id: &str, name: &str) -> CategoryFields {
        CategoryFields {
            image_id: image_id.to_string(),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn spend(category_id: &str, cents: i64) -> TransactionFields {
        TransactionFields {
            category_id: category_id.to_string(),
            amount: Decimal::new(cents, 2),
            description: "spend".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 5, 17).unwrap(),
        }
    }

    #[test]
    fn wallets_come_back_in_submission_order() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");

        let created = f
            .interactor
            .create_wallets(&session, vec![wallet("Cash"), wallet("Bank"), wallet("Card")])
            .unwrap();

        let names: Vec<&str> = created.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Cash", "Bank", "Card"]);
        let ids: HashSet<&str> = created.iter().map(|w| w.wallet_id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(created.iter().all(|w| w.account_id == session.account_id));
    }

    #[test]
    fn empty_batch_touches_nothing() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        f.store.set_unavailable(true);

        assert!(f.interactor.create_wallets(&session, Vec::new()).unwrap().is_empty());
        assert!(f
            .interactor
            .create_transactions(&session, "any", Vec::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn wallet_access_secret_is_stored_derived() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let mut locked = wallet("Vault");
        locked.access_secret = Some("vault-pin".to_string());

        let created = f.interactor.create_wallets(&session, vec![locked]).unwrap();
        let vault = &created[0];
        let credential = vault.access_credential.as_ref().unwrap();
        assert_ne!(credential.as_str(), "vault-pin");
        assert!(f
            .interactor
            .verify_wallet_access(&session, &vault.wallet_id, "vault-pin")
            .unwrap());
        assert!(!f
            .interactor
            .verify_wallet_access(&session, &vault.wallet_id, "guess")
            .unwrap());

        // Renaming keeps the credential
        let renamed = f
            .interactor
            .update_wallet(&session, &vault.wallet_id, wallet("Safe"))
            .unwrap();
        assert_eq!(renamed.access_credential.as_ref(), Some(credential));
        assert_eq!(renamed.created_at, vault.created_at);
    }

    #[test]
    fn category_batch_with_dangling_image_is_rejected_whole() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let image_id = icon(&f, &session);

        let err = f
            .interactor
            .create_categories(
                &session,
                vec![
                    category(&image_id, "Food"),
                    category(&image_id, "Rent"),
                    category("no-such-image", "Fun"),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(f.interactor.list_categories(&session).unwrap().is_empty());
    }

    #[test]
    fn transaction_batch_rolls_back_on_bad_category() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let image_id = icon(&f, &session);
        let wallet_id = f
            .interactor
            .create_wallets(&session, vec![wallet("Cash")])
            .unwrap()
            .remove(0)
            .wallet_id;
        let category_id = f
            .interactor
            .create_categories(&session, vec![category(&image_id, "Food")])
            .unwrap()
            .remove(0)
            .category_id;

        let err = f
            .interactor
            .create_transactions(
                &session,
                &wallet_id,
                vec![spend(&category_id, -450), spend("missing", -100)],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.store.row_count(Transaction::TABLE), 0);

        let created = f
            .interactor
            .create_transactions(
                &session,
                &wallet_id,
                vec![spend(&category_id, -450), spend(&category_id, 12000)],
            )
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].amount, Decimal::new(-450, 2));
        assert_eq!(
            f.interactor
                .list_transactions(&session, Some(&wallet_id))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn transactions_for_unknown_wallet_are_not_found() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let err = f
            .interactor
            .create_transactions(&session, "nope", vec![spend("c", 1)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.stage(), Stage::PrimaryRead);
    }

    #[test]
    fn deleting_a_wallet_removes_its_transactions() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let image_id = icon(&f, &session);
        let wallets = f
            .interactor
            .create_wallets(&session, vec![wallet("Cash"), wallet("Bank")])
            .unwrap();
        let category_id = f
            .interactor
            .create_categories(&session, vec![category(&image_id, "Food")])
            .unwrap()
            .remove(0)
            .category_id;
        for w in &wallets {
            f.interactor
                .create_transactions(&session, &w.wallet_id, vec![spend(&category_id, -1)])
                .unwrap();
        }

        f.interactor
            .delete_wallet(&session, &wallets[0].wallet_id)
            .unwrap();
        let remaining = f.interactor.list_transactions(&session, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].wallet_id, wallets[1].wallet_id);
    }

    #[test]
    fn update_transaction_keeps_identity() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        let image_id = icon(&f, &session);
        let wallet_id = f
            .interactor
            .create_wallets(&session, vec![wallet("Cash")])
            .unwrap()
            .remove(0)
            .wallet_id;
        let category_id = f
            .interactor
            .create_categories(&session, vec![category(&image_id, "Food")])
            .unwrap()
            .remove(0)
            .category_id;
        let original = f
            .interactor
            .create_transactions(&session, &wallet_id, vec![spend(&category_id, -100)])
            .unwrap()
            .remove(0);

        let updated = f
            .interactor
            .update_transaction(
                &session,
                &wallet_id,
                &original.transaction_id,
                spend(&category_id, -250),
            )
            .unwrap();
        assert_eq!(updated.transaction_id, original.transaction_id);
        assert_eq!(updated.amount, Decimal::new(-250, 2));
        assert_eq!(updated.created_at, original.created_at);

        f.interactor
            .delete_transaction(&session, &wallet_id, &original.transaction_id)
            .unwrap();
        let err = f
            .interactor
            .get_transaction(&session, &wallet_id, &original.transaction_id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn store_outage_is_reported_with_stage() {
        let f = fixture(false);
        let session = signed_in(&f.interactor, "ada@example.com");
        f.store.set_unavailable(true);

        let err = f
            .interactor
            .create_wallets(&session, vec![wallet("Cash")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(err.stage(), Stage::PrimaryWrite);

        let err = f.interactor.list_wallets(&session).unwrap_err();
        assert_eq!(err.stage(), Stage::PrimaryRead);
    }
}
