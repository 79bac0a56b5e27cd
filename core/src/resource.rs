//! The fixed set of path segments the remote API recognizes.
//!
//! # Design
//! Segments are an enum rather than free strings so the typed builder methods
//! cannot produce an unknown path. String lookups go through `FromStr`, which
//! is the only place the allow-list is checked.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An allow-listed resource or sub-resource segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Charges,
    Customers,
    Cards,
    Subscription,
    Plans,
    Coupons,
    Discount,
    Invoices,
    Upcoming,
    Lines,
    InvoiceItems,
    Dispute,
    Close,
    Transfers,
    Cancel,
    Recipients,
    ApplicationFees,
    Refund,
    Account,
    Balance,
    History,
    Events,
    Tokens,
    Incoming,
}

impl Resource {
    pub const ALL: [Resource; 24] = [
        Resource::Charges,
        Resource::Customers,
        Resource::Cards,
        Resource::Subscription,
        Resource::Plans,
        Resource::Coupons,
        Resource::Discount,
        Resource::Invoices,
        Resource::Upcoming,
        Resource::Lines,
        Resource::InvoiceItems,
        Resource::Dispute,
        Resource::Close,
        Resource::Transfers,
        Resource::Cancel,
        Resource::Recipients,
        Resource::ApplicationFees,
        Resource::Refund,
        Resource::Account,
        Resource::Balance,
        Resource::History,
        Resource::Events,
        Resource::Tokens,
        Resource::Incoming,
    ];

    /// The segment exactly as it appears in the URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Charges => "charges",
            Resource::Customers => "customers",
            Resource::Cards => "cards",
            Resource::Subscription => "subscription",
            Resource::Plans => "plans",
            Resource::Coupons => "coupons",
            Resource::Discount => "discount",
            Resource::Invoices => "invoices",
            Resource::Upcoming => "upcoming",
            Resource::Lines => "lines",
            Resource::InvoiceItems => "invoiceitems",
            Resource::Dispute => "dispute",
            Resource::Close => "close",
            Resource::Transfers => "transfers",
            Resource::Cancel => "cancel",
            Resource::Recipients => "recipients",
            Resource::ApplicationFees => "application_fees",
            Resource::Refund => "refund",
            Resource::Account => "account",
            Resource::Balance => "balance",
            Resource::History => "history",
            Resource::Events => "events",
            Resource::Tokens => "tokens",
            // Undocumented upstream, kept for compatibility.
            Resource::Incoming => "incoming",
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::UnknownResource(s.to_string()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named accessors for every allow-listed segment.
///
/// Implemented by anything a segment can be appended to: the clients (which
/// start a fresh path at the base endpoint), request builders and bare paths.
pub trait Resources: Sized {
    type Output;

    fn resource(self, resource: Resource) -> Self::Output;

    fn charges(self) -> Self::Output {
        self.resource(Resource::Charges)
    }

    fn customers(self) -> Self::Output {
        self.resource(Resource::Customers)
    }

    fn cards(self) -> Self::Output {
        self.resource(Resource::Cards)
    }

    fn subscription(self) -> Self::Output {
        self.resource(Resource::Subscription)
    }

    fn plans(self) -> Self::Output {
        self.resource(Resource::Plans)
    }

    fn coupons(self) -> Self::Output {
        self.resource(Resource::Coupons)
    }

    fn discount(self) -> Self::Output {
        self.resource(Resource::Discount)
    }

    fn invoices(self) -> Self::Output {
        self.resource(Resource::Invoices)
    }

    fn upcoming(self) -> Self::Output {
        self.resource(Resource::Upcoming)
    }

    fn lines(self) -> Self::Output {
        self.resource(Resource::Lines)
    }

    fn invoice_items(self) -> Self::Output {
        self.resource(Resource::InvoiceItems)
    }

    fn dispute(self) -> Self::Output {
        self.resource(Resource::Dispute)
    }

    fn close(self) -> Self::Output {
        self.resource(Resource::Close)
    }

    fn transfers(self) -> Self::Output {
        self.resource(Resource::Transfers)
    }

    fn cancel(self) -> Self::Output {
        self.resource(Resource::Cancel)
    }

    fn recipients(self) -> Self::Output {
        self.resource(Resource::Recipients)
    }

    fn application_fees(self) -> Self::Output {
        self.resource(Resource::ApplicationFees)
    }

    fn refund(self) -> Self::Output {
        self.resource(Resource::Refund)
    }

    fn account(self) -> Self::Output {
        self.resource(Resource::Account)
    }

    fn balance(self) -> Self::Output {
        self.resource(Resource::Balance)
    }

    fn history(self) -> Self::Output {
        self.resource(Resource::History)
    }

    fn events(self) -> Self::Output {
        self.resource(Resource::Events)
    }

    fn tokens(self) -> Self::Output {
        self.resource(Resource::Tokens)
    }

    fn incoming(self) -> Self::Output {
        self.resource(Resource::Incoming)
    }
}
