use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::designation::Designation;
use crate::sheet::attendance::WorkerAttendanceRow;

/// Employees' Provident Fund share of gross pay, in percent.
pub const EPF_PERCENT: u64 = 12;
pub const SIGNATURE_LABEL: &str = "A/C Transfer";

/// Day rate per designation bucket.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRateTable {
    #[schema(example = 633)]
    pub high_skilled: u64,
    #[schema(example = 571)]
    pub skilled: u64,
    #[schema(example = 466)]
    pub unskilled: u64,
}

impl Default for SkillRateTable {
    fn default() -> Self {
        SkillRateTable {
            high_skilled: 633,
            skilled: 571,
            unskilled: 466,
        }
    }
}

impl SkillRateTable {
    pub fn rate_for(&self, designation: Designation) -> u64 {
        match designation {
            Designation::HighSkilled => self.high_skilled,
            Designation::Skilled => self.skilled,
            Designation::Unskilled => self.unskilled,
        }
    }
}

/// ceil(gross * 12 / 100); always rounds up.
pub fn epf_deduction(gross: u64) -> u64 {
    (gross * EPF_PERCENT).div_ceil(100)
}

#[derive(Debug, Error, PartialEq)]
#[error("other payment must be a non-negative number, got {0}")]
pub struct InvalidAmount(pub f64);

/// One worker's line on the payment sheet.
///
/// Gross, EPF and balance are fixed at derivation time; only other payment
/// (and the total that follows from it) can change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    sr_no: usize,
    worker_id: String,
    worker_name: String,
    designation: Designation,
    total_days: u32,
    rate: u64,
    gross: u64,
    epf_deduction: u64,
    balance: u64,
    other_payment: f64,
    total_payment: f64,
    #[schema(value_type = String, example = "A/C Transfer")]
    signature: &'static str,
    ncp_days: u32,
}

impl PaymentLine {
    pub fn derive(sr_no: usize, row: &WorkerAttendanceRow, rates: &SkillRateTable) -> Self {
        let total_days = row.present_count();
        let rate = rates.rate_for(row.designation());
        let gross = u64::from(total_days) * rate;
        let epf = epf_deduction(gross);
        let balance = gross - epf;

        PaymentLine {
            sr_no,
            worker_id: row.worker_id().to_string(),
            worker_name: row.name().to_string(),
            designation: row.designation(),
            total_days,
            rate,
            gross,
            epf_deduction: epf,
            balance,
            other_payment: 0.0,
            total_payment: balance as f64,
            signature: SIGNATURE_LABEL,
            ncp_days: row.ncp_count(),
        }
    }

    pub fn set_other_payment(&mut self, amount: f64) -> Result<(), InvalidAmount> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(InvalidAmount(amount));
        }
        self.other_payment = amount;
        self.total_payment = self.balance as f64 + amount;
        Ok(())
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn designation(&self) -> Designation {
        self.designation
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    pub fn gross(&self) -> u64 {
        self.gross
    }

    pub fn epf(&self) -> u64 {
        self.epf_deduction
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn other_payment(&self) -> f64 {
        self.other_payment
    }

    pub fn total_payment(&self) -> f64 {
        self.total_payment
    }

    pub fn ncp_days(&self) -> u32 {
        self.ncp_days
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub total_days: u32,
    pub gross: u64,
    pub epf_deduction: u64,
    pub balance: u64,
    pub other_payment: f64,
    pub total_payment: f64,
    pub ncp_days: u32,
}

impl PaymentTotals {
    pub fn from_lines(lines: &[PaymentLine]) -> Self {
        lines.iter().fold(PaymentTotals::default(), |mut acc, l| {
            acc.total_days += l.total_days();
            acc.gross += l.gross();
            acc.epf_deduction += l.epf();
            acc.balance += l.balance();
            acc.other_payment += l.other_payment();
            acc.total_payment += l.total_payment();
            acc.ncp_days += l.ncp_days();
            acc
        })
    }
}

/// Present days worked per designation bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillSummary {
    pub high_skilled: u32,
    pub skilled: u32,
    pub unskilled: u32,
}

impl SkillSummary {
    pub fn from_lines(lines: &[PaymentLine]) -> Self {
        lines.iter().fold(SkillSummary::default(), |mut acc, l| {
            match l.designation() {
                Designation::HighSkilled => acc.high_skilled += l.total_days(),
                Designation::Skilled => acc.skilled += l.total_days(),
                Designation::Unskilled => acc.unskilled += l.total_days(),
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceMark::{Absent as A, Off as O, Present as P};

    fn row(designation: Designation, present: usize, absent: usize) -> WorkerAttendanceRow {
        let mut marks = vec![P; present];
        marks.extend(vec![A; absent]);
        marks.extend(vec![O; 31usize.saturating_sub(present + absent)]);
        WorkerAttendanceRow::new("w-1", "GULZAR SINGH", designation, marks)
    }

    #[test]
    fn epf_rounds_up_never_down() {
        assert_eq!(epf_deduction(0), 0);
        assert_eq!(epf_deduction(1000), 120);
        assert_eq!(epf_deduction(1001), 121);
        assert_eq!(epf_deduction(1), 1);
        assert_eq!(epf_deduction(17 * 466), 951);
        assert_eq!(epf_deduction(15417), 1851);
    }

    #[test]
    fn skilled_worker_with_twenty_seven_days() {
        let line = PaymentLine::derive(1, &row(Designation::Skilled, 27, 0), &SkillRateTable::default());

        assert_eq!(line.total_days(), 27);
        assert_eq!(line.rate, 571);
        assert_eq!(line.gross(), 15417);
        assert_eq!(line.epf(), 1851);
        assert_eq!(line.balance(), 13566);
        assert_eq!(line.other_payment(), 0.0);
        assert_eq!(line.total_payment(), 13566.0);
        assert_eq!(line.ncp_days(), 0);
        assert_eq!(line.signature, SIGNATURE_LABEL);
    }

    #[test]
    fn rate_follows_designation() {
        let rates = SkillRateTable {
            high_skilled: 700,
            skilled: 600,
            unskilled: 500,
        };
        let high = PaymentLine::derive(1, &row(Designation::HighSkilled, 10, 2), &rates);
        let low = PaymentLine::derive(2, &row(Designation::Unskilled, 10, 2), &rates);
        assert_eq!(high.gross(), 7000);
        assert_eq!(low.gross(), 5000);
        assert_eq!(high.ncp_days(), 2);
    }

    #[test]
    fn other_payment_only_moves_the_total() {
        let mut line = PaymentLine::derive(1, &row(Designation::Skilled, 27, 0), &SkillRateTable::default());
        let (gross, epf, balance) = (line.gross(), line.epf(), line.balance());

        line.set_other_payment(250.5).unwrap();
        assert_eq!(line.total_payment(), 13816.5);
        line.set_other_payment(0.0).unwrap();
        assert_eq!(line.total_payment(), 13566.0);

        assert_eq!((line.gross(), line.epf(), line.balance()), (gross, epf, balance));
    }

    #[test]
    fn negative_or_nan_other_payment_is_refused() {
        let mut line = PaymentLine::derive(1, &row(Designation::Skilled, 3, 0), &SkillRateTable::default());
        line.set_other_payment(100.0).unwrap();

        assert_eq!(line.set_other_payment(-1.0), Err(InvalidAmount(-1.0)));
        assert!(line.set_other_payment(f64::NAN).is_err());
        assert_eq!(line.other_payment(), 100.0);
        assert_eq!(line.total_payment(), line.balance() as f64 + 100.0);
    }

    #[test]
    fn totals_and_skill_summary() {
        let rates = SkillRateTable::default();
        let mut lines = vec![
            PaymentLine::derive(1, &row(Designation::HighSkilled, 25, 1), &rates),
            PaymentLine::derive(2, &row(Designation::Skilled, 27, 0), &rates),
            PaymentLine::derive(3, &row(Designation::Skilled, 20, 4), &rates),
        ];
        lines[0].set_other_payment(500.0).unwrap();

        let totals = PaymentTotals::from_lines(&lines);
        assert_eq!(totals.total_days, 72);
        assert_eq!(totals.ncp_days, 5);
        assert_eq!(totals.gross, 25 * 633 + 27 * 571 + 20 * 571);
        assert_eq!(totals.gross, totals.epf_deduction + totals.balance);
        assert_eq!(totals.total_payment, totals.balance as f64 + 500.0);

        let summary = SkillSummary::from_lines(&lines);
        assert_eq!(summary, SkillSummary { high_skilled: 25, skilled: 47, unskilled: 0 });
    }
}
