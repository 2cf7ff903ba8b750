// src/services/allocation.rs
//
// O algoritmo de alocação do ledger, implementado UMA vez, puro e sem I/O.
// Tanto o serviço de pagamentos quanto o de vendas chamam este módulo; os
// dois caminhos nunca podem divergir.
//
// O modelo: um cliente carrega dois saldos globais, crédito (dinheiro pago a
// mais) e dívida (soma das vendas em aberto). Dinheiro novo primeiro quita
// dívida, da venda mais antiga para a mais nova; o que sobrar vira crédito.
// Dívida nova primeiro consome crédito existente. Em estado assentado, no
// máximo um dos dois saldos é positivo.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::common::error::AppError;

/// Uma venda em aberto, na ordem em que deve ser paga (mais antiga primeiro).
#[derive(Debug, Clone)]
pub struct OutstandingSale {
    pub sale_id: Uuid,
    pub remaining_balance: Decimal,
}

/// Quanto de fundos foi atribuído a uma venda específica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleAllocation {
    pub sale_id: Uuid,
    pub amount_applied: Decimal,
}

/// Resultado da alocação: as atribuições por venda e os novos saldos globais.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub allocations: Vec<SaleAllocation>,
    pub credit_balance: Decimal,
    pub total_debt: Decimal,
    pub total_allocated: Decimal,
}

/// Distribui `incoming_amount` (dinheiro novo) mais o crédito existente
/// pelas vendas em aberto, na ordem recebida, e recalcula os saldos.
///
/// `pool = incoming_amount + existing_credit`. Para cada venda, aplica
/// `min(pool, saldo restante)` até o pool esgotar. Depois:
/// `total_debt = max(0, existing_debt - total_alocado)` e o que sobrar do
/// pool vira crédito. O passo único paga ao mesmo tempo os saldos por venda
/// e o contador agregado de dívida, então os dois têm de concordar sempre.
///
/// `incoming_amount == 0` com crédito positivo ainda roda (crédito sozinho
/// quita dívida). Sequência vazia: nenhuma alocação, pool inteiro vira
/// crédito. Valor negativo é rejeitado antes de qualquer efeito.
pub fn allocate(
    incoming_amount: Decimal,
    existing_credit: Decimal,
    existing_debt: Decimal,
    outstanding: &[OutstandingSale],
) -> Result<AllocationOutcome, AppError> {
    if incoming_amount < Decimal::ZERO {
        return Err(AppError::InvalidAmount(format!(
            "valor recebido não pode ser negativo: {incoming_amount}"
        )));
    }

    let mut pool = incoming_amount + existing_credit;
    let mut total_allocated = Decimal::ZERO;
    let mut allocations = Vec::new();

    for sale in outstanding {
        if pool <= Decimal::ZERO {
            break;
        }

        let applied = pool.min(sale.remaining_balance);
        if applied > Decimal::ZERO {
            allocations.push(SaleAllocation {
                sale_id: sale.sale_id,
                amount_applied: applied,
            });
            pool -= applied;
            total_allocated += applied;
        }
    }

    let total_debt = (existing_debt - total_allocated).max(Decimal::ZERO);

    Ok(AllocationOutcome {
        allocations,
        // o que não foi consumido vira crédito (zero se nada sobrou)
        credit_balance: pool,
        total_debt,
        total_allocated,
    })
}

/// Reparte as alocações entre dinheiro novo e crédito, para a trilha de
/// auditoria: o dinheiro do pagamento é atribuído primeiro, na ordem das
/// alocações; esgotado ele, o restante foi financiado por crédito e não gera
/// vínculo (o campo credit_applied da venda é a auditoria dessa parte).
/// Garante `soma(vínculos) <= valor do pagamento`.
pub fn cash_link_amounts(
    cash_amount: Decimal,
    allocations: &[SaleAllocation],
) -> Vec<SaleAllocation> {
    let mut cash_left = cash_amount;
    let mut links = Vec::new();

    for alloc in allocations {
        if cash_left <= Decimal::ZERO {
            break;
        }

        let from_cash = cash_left.min(alloc.amount_applied);
        if from_cash > Decimal::ZERO {
            links.push(SaleAllocation {
                sale_id: alloc.sale_id,
                amount_applied: from_cash,
            });
            cash_left -= from_cash;
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sale(id: u128, balance: Decimal) -> OutstandingSale {
        OutstandingSale {
            sale_id: Uuid::from_u128(id),
            remaining_balance: balance,
        }
    }

    #[test]
    fn fifo_pays_oldest_sale_first() {
        // S1 (antiga, 100) e S2 (nova, 50): pagamento de 120 quita S1
        // e aplica 20 em S2.
        let outstanding = [sale(1, dec!(100)), sale(2, dec!(50))];
        let outcome = allocate(dec!(120), dec!(0), dec!(150), &outstanding).unwrap();

        assert_eq!(outcome.allocations.len(), 2);
        assert_eq!(outcome.allocations[0].sale_id, Uuid::from_u128(1));
        assert_eq!(outcome.allocations[0].amount_applied, dec!(100));
        assert_eq!(outcome.allocations[1].amount_applied, dec!(20));
        assert_eq!(outcome.total_debt, dec!(30));
        assert_eq!(outcome.credit_balance, dec!(0));
        assert_eq!(outcome.total_allocated, dec!(120));
    }

    #[test]
    fn excess_payment_becomes_credit() {
        // 150 contra uma única venda de 100: venda quitada, 50 de crédito.
        let outstanding = [sale(1, dec!(100))];
        let outcome = allocate(dec!(150), dec!(0), dec!(100), &outstanding).unwrap();

        assert_eq!(outcome.allocations.len(), 1);
        assert_eq!(outcome.allocations[0].amount_applied, dec!(100));
        assert_eq!(outcome.credit_balance, dec!(50));
        assert_eq!(outcome.total_debt, dec!(0));
    }

    #[test]
    fn existing_credit_joins_the_pool() {
        // 30 de dinheiro novo + 40 de crédito contra venda de 100
        let outstanding = [sale(1, dec!(100))];
        let outcome = allocate(dec!(30), dec!(40), dec!(100), &outstanding).unwrap();

        assert_eq!(outcome.allocations[0].amount_applied, dec!(70));
        assert_eq!(outcome.total_debt, dec!(30));
        assert_eq!(outcome.credit_balance, dec!(0));
    }

    #[test]
    fn credit_alone_settles_debt() {
        // incoming zero com crédito positivo ainda roda: o crédito sozinho
        // quita dívida (importa para o caminho de criação de venda).
        let outstanding = [sale(1, dec!(25))];
        let outcome = allocate(dec!(0), dec!(40), dec!(25), &outstanding).unwrap();

        assert_eq!(outcome.allocations[0].amount_applied, dec!(25));
        assert_eq!(outcome.total_debt, dec!(0));
        assert_eq!(outcome.credit_balance, dec!(15));
    }

    #[test]
    fn empty_sequence_turns_pool_into_credit() {
        let outcome = allocate(dec!(80), dec!(20), dec!(0), &[]).unwrap();

        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.credit_balance, dec!(100));
        assert_eq!(outcome.total_debt, dec!(0));
        assert_eq!(outcome.total_allocated, dec!(0));
    }

    #[test]
    fn stops_early_once_pool_is_exhausted() {
        let outstanding = [sale(1, dec!(40)), sale(2, dec!(40)), sale(3, dec!(40))];
        let outcome = allocate(dec!(60), dec!(0), dec!(120), &outstanding).unwrap();

        // terceira venda não recebe nada e não aparece no resultado
        assert_eq!(outcome.allocations.len(), 2);
        assert_eq!(outcome.allocations[0].amount_applied, dec!(40));
        assert_eq!(outcome.allocations[1].amount_applied, dec!(20));
        assert_eq!(outcome.total_debt, dec!(60));
    }

    #[test]
    fn rejects_negative_incoming_amount() {
        let result = allocate(dec!(-1), dec!(0), dec!(0), &[]);
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn never_leaves_both_balances_positive() {
        // Quando a sequência cobre toda a dívida (como no serviço de
        // pagamentos), sobra no pool implica dívida zerada.
        let outstanding = [sale(1, dec!(30)), sale(2, dec!(70))];
        let outcome = allocate(dec!(130), dec!(0), dec!(100), &outstanding).unwrap();

        assert_eq!(outcome.total_debt, dec!(0));
        assert_eq!(outcome.credit_balance, dec!(30));
        assert!(outcome.credit_balance >= Decimal::ZERO);
        assert!(outcome.total_debt >= Decimal::ZERO);
    }

    #[test]
    fn conservation_across_a_sequence_of_payments() {
        // dívida_inicial - total_alocado == dívida_final, e cada centavo do
        // pool termina em uma venda ou no crédito.
        let mut sales = vec![sale(1, dec!(55.25)), sale(2, dec!(44.75)), sale(3, dec!(10))];
        let mut debt = dec!(110);
        let mut credit = dec!(0);

        for payment in [dec!(30), dec!(50.50), dec!(40)] {
            let outcome = allocate(payment, credit, debt, &sales).unwrap();

            let applied: Decimal = outcome
                .allocations
                .iter()
                .map(|a| a.amount_applied)
                .sum();
            assert_eq!(applied, outcome.total_allocated);
            // conservação: pool inteiro = alocado + crédito restante
            assert_eq!(payment + credit, applied + outcome.credit_balance);
            assert_eq!(outcome.total_debt, (debt - applied).max(Decimal::ZERO));

            // aplica o resultado nas vendas para a próxima rodada
            for alloc in &outcome.allocations {
                let s = sales.iter_mut().find(|s| s.sale_id == alloc.sale_id).unwrap();
                s.remaining_balance -= alloc.amount_applied;
                assert!(s.remaining_balance >= Decimal::ZERO);
            }
            sales.retain(|s| s.remaining_balance > Decimal::ZERO);

            debt = outcome.total_debt;
            credit = outcome.credit_balance;

            // invariante cruzada: agregado bate com a soma por venda
            let per_sale: Decimal = sales.iter().map(|s| s.remaining_balance).sum();
            assert_eq!(debt, per_sale);
        }

        // 120.50 pagos contra 110 de dívida: tudo quitado, 10.50 de crédito
        assert_eq!(debt, dec!(0));
        assert_eq!(credit, dec!(10.50));
        assert!(sales.is_empty());
    }

    #[test]
    fn cash_links_are_attributed_before_credit() {
        // pool de 70 = 30 em dinheiro + 40 de crédito, aplicado em uma venda:
        // o vínculo registra só a parte em dinheiro.
        let allocations = [SaleAllocation {
            sale_id: Uuid::from_u128(1),
            amount_applied: dec!(70),
        }];
        let links = cash_link_amounts(dec!(30), &allocations);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].amount_applied, dec!(30));
    }

    #[test]
    fn cash_links_split_across_sales_never_exceed_cash() {
        let allocations = [
            SaleAllocation {
                sale_id: Uuid::from_u128(1),
                amount_applied: dec!(50),
            },
            SaleAllocation {
                sale_id: Uuid::from_u128(2),
                amount_applied: dec!(30),
            },
        ];
        let links = cash_link_amounts(dec!(60), &allocations);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].amount_applied, dec!(50));
        assert_eq!(links[1].amount_applied, dec!(10));

        let linked: Decimal = links.iter().map(|l| l.amount_applied).sum();
        assert!(linked <= dec!(60));
    }

    #[test]
    fn no_links_when_everything_came_from_credit() {
        let allocations = [SaleAllocation {
            sale_id: Uuid::from_u128(1),
            amount_applied: dec!(40),
        }];
        assert!(cash_link_amounts(dec!(0), &allocations).is_empty());
    }
}
