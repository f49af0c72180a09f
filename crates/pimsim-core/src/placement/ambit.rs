use crate::error::Result;
use crate::layout::{Region, RowMapping};
use crate::memory::{Bank, Word};
use log::info;

/// Initializes the rows AMBIT reserves at the tail of the bank.
///
/// The control group is set to C0 = zeros and C1 = ones, each dual-contact-cell
/// pair to `DCC_i` = zeros and `!DCC_i` = ones, and every compute register to
/// zeros. Regions missing from `mapping` are skipped.
///
/// # Errors
///
/// Returns an error if a mapped region lies outside the bank.
pub fn reset_ambit_control_rows(bank: &mut Bank, mapping: &RowMapping) -> Result<()> {
    info!("initializing AMBIT control, DCC and compute rows");
    let rb = bank.row_bytes();
    let zero = Word::zero(rb);
    let ones = Word::ones(rb);

    if let Some(control) = mapping.get(Region::AmbitControlRows) {
        for (offset, row) in control.iter().enumerate() {
            bank.set_row(row, if offset % 2 == 0 { &zero } else { &ones })?;
        }
    }
    if let Some(dcc) = mapping.get(Region::AmbitDccRows) {
        for (offset, row) in dcc.iter().enumerate() {
            bank.set_row(row, if offset % 2 == 0 { &zero } else { &ones })?;
        }
    }
    if let Some(compute) = mapping.get(Region::AmbitComputeRows) {
        for row in compute.iter() {
            bank.set_row(row, &zero)?;
        }
    }
    Ok(())
}
