use crate::domain::{BalanceSummary, Decimal, DirectedDebt};

/// Sum unsettled debts into what the user is owed and what they owe.
pub fn aggregate(debts: &[DirectedDebt]) -> BalanceSummary {
    let (owing, owed) = debts
        .iter()
        .filter(|d| !d.is_settled())
        .fold((Decimal::zero(), Decimal::zero()), |(owing, owed), d| {
            if d.is_user_debtor {
                (owing + d.amount, owed)
            } else {
                (owing, owed + d.amount)
            }
        });

    BalanceSummary {
        owed,
        owing,
        net: owed - owing,
    }
}
