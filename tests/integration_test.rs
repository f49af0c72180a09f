use pimsim::config::{AmbitCaps, BlimpCaps, DatabaseProfile, HardwareProfile, SystemConfig};
use pimsim::error::{CapacityError, RangeError};
use pimsim::hashmap::{BucketFormat, ChainedHashTable};
use pimsim::layout::{Layout, LayoutKind, LayoutPlanner, Region, RowRange};
use pimsim::memory::{Bank, DEFAULT_BYTE, Word};
use pimsim::placement::{PlacementPolicy, place, read_bitplane_item};
use pimsim::records::{FieldGenerator, ItemKind, RecordGenerator, RecordSource};
use pimsim::util::{Rng, Size};

fn pim_hardware(bank: Size, row_buffer: Size) -> anyhow::Result<HardwareProfile> {
    Ok(HardwareProfile::new(bank, row_buffer, 32.0, 14.0, 14.0)?
        .with_blimp(BlimpCaps {
            blimp_frequency: 200_000_000,
            time_to_v0_transfer_ns: 2.0,
            blimp_processor_bit_architecture: 64,
            vector: None,
        })
        .with_ambit(AmbitCaps {
            ambit_compute_register_rows: 6,
            ambit_dcc_rows: 2,
        }))
}

#[test]
fn test_aligned_capacity_on_32mb_bank() -> anyhow::Result<()> {
    let hardware = HardwareProfile::new(Size::MB(32), Size::KB(1), 32.0, 14.0, 14.0)?;
    let database = DatabaseProfile::new(64, 8)?;
    let layout = LayoutPlanner::new(&hardware, &database).plan("cpu-aligned".parse()?)?;
    assert_eq!(layout.metadata().total_rows_for_records, 32768);
    assert_eq!(layout.metadata().total_records_processable, 524288);
    Ok(())
}

#[test]
fn test_hash_table_overflow_and_capacity() -> anyhow::Result<()> {
    let mut table = ChainedHashTable::new(BucketFormat::BLIMP, 1, 2)?;
    for key in 0..32 {
        table.insert(key, 0)?;
    }
    assert_eq!(table.buckets().len(), 2);
    assert_eq!(table.buckets()[0].next_bucket(), Some(1));
    for key in 32..62 {
        table.insert(key, 0)?;
    }
    let overflow = table.insert(62, 0);
    assert!(matches!(
        overflow,
        Err(pimsim::hashmap::Error::Capacity(CapacityError::Buckets { maximum: 2 }))
    ));
    for key in 0..62 {
        assert_eq!(table.fetch(key), Some(0));
    }
    assert_eq!(table.fetch(62), None);
    Ok(())
}

#[test]
fn test_triple_row_activation_majority() -> anyhow::Result<()> {
    let hardware = HardwareProfile::new(Size::B(16), Size::B(1), 1.0, 1.0, 1.0)?;
    let mut bank = Bank::new(hardware, DEFAULT_BYTE)?;
    bank.set_row(0, &Word::from_u128(0b1010, 1)?)?;
    bank.set_row(1, &Word::from_u128(0b1100, 1)?)?;
    bank.set_row(2, &Word::from_u128(0b0110, 1)?)?;
    let result = bank.triple_row_activate(0, 1, 2, false)?;
    assert_eq!(result.to_u128(), Some(0b1110));
    for row in 0..3 {
        assert_eq!(bank.get_row(row)?.to_u128(), Some(0b1110));
    }
    Ok(())
}

#[test]
fn test_row_value_must_fit_row_buffer() -> anyhow::Result<()> {
    let hardware = HardwareProfile::new(Size::B(64), Size::B(8), 1.0, 1.0, 1.0)?;
    let mut bank = Bank::new(hardware, DEFAULT_BYTE)?;
    let too_wide = Word::from_u128(1 << 64, 9)?;
    assert!(matches!(
        bank.set_row(3, &too_wide),
        Err(pimsim::Error::Range(RangeError::Width { .. }))
    ));
    let max = Word::ones(8);
    bank.set_row(3, &max)?;
    assert_eq!(bank.get_row(3)?, max);
    Ok(())
}

#[test]
fn test_bitplane_roundtrip_random_items() -> anyhow::Result<()> {
    let hardware = HardwareProfile::new(Size::KB(2), Size::B(16), 1.0, 1.0, 1.0)?;
    let mut bank = Bank::new(hardware, DEFAULT_BYTE)?;
    let mut source = RecordGenerator::new(
        3,
        3,
        FieldGenerator::UniformRandom(Rng::from_seed(11)),
        FieldGenerator::Incremental,
    )
    .with_total(300);
    let expected: Vec<Word> = (0..300)
        .filter_map(|k| source.get(k).map(|(index, _)| index.clone()))
        .collect();
    let region = RowRange::new(8, 72);
    let placed = place(
        PlacementPolicy::BitPlaneVertical,
        region,
        3,
        source.items(ItemKind::Index),
        &mut bank,
        usize::MAX,
    )?;
    assert_eq!(placed.items, 300);
    for (k, item) in expected.iter().enumerate() {
        assert_eq!(&read_bitplane_item(&bank, region, 3, k)?, item);
    }
    Ok(())
}

#[test]
fn test_plan_perform_dump_reload() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = SystemConfig {
        hardware: pim_hardware(Size::KB(64), Size::B(128))?,
        database: DatabaseProfile::new(32, 4)?
            .with_hitmaps(1)
            .with_blimp_regions(512, 256)
            .with_ambit_temporaries(4),
    };
    let dir = std::env::temp_dir();
    let config_path = dir.join("pimsim-it-system.json");
    config.save(&config_path)?;
    let config = SystemConfig::from_jsonfile(&config_path)?;

    let kind: LayoutKind = "blimp-ambit-pi-field".parse()?;
    let layout = LayoutPlanner::new(&config.hardware, &config.database)
        .with_record_hint(Some(1500))
        .plan(kind)?;
    let layout_path = dir.join("pimsim-it-layout.json");
    layout.save(&layout_path)?;
    let layout = Layout::from_jsonfile(&layout_path)?;
    assert_eq!(layout.metadata().total_records_processable, 1500);

    let mut bank = Bank::new(config.hardware.clone(), DEFAULT_BYTE)?;
    let mut source = RecordGenerator::for_database(
        &config.database,
        FieldGenerator::Incremental,
        FieldGenerator::Constant(0xC0FFEE),
    );
    let placed = layout.perform(&mut bank, &mut source)?;
    assert_eq!(placed.items, 1500);

    let pi_field = layout.mapping().get(Region::PiField).unwrap_or_default();
    assert_eq!(read_bitplane_item(&bank, pi_field, 4, 1234)?.to_u128(), Some(1234));
    let data = layout.mapping().get(Region::Data).unwrap_or_default();
    let first = bank.get_row(data.start)?;
    assert_eq!(&first.as_bytes()[..4], &[0, 0, 0, 0]);
    assert_eq!(&first.as_bytes()[28..32], &[0, 0xC0, 0xFF, 0xEE]);

    let dump_path = dir.join("pimsim-it-bank.txt");
    bank.save(&dump_path)?;
    let reloaded = Bank::load(&dump_path)?;
    for path in [&config_path, &layout_path, &dump_path] {
        std::fs::remove_file(path)?;
    }
    assert_eq!(reloaded.row_count(), bank.row_count());
    for row in 0..bank.row_count() {
        assert_eq!(reloaded.row(row)?, bank.row(row)?);
    }
    Ok(())
}

#[test]
fn test_hash_table_in_blimp_scratch_region() -> anyhow::Result<()> {
    let hardware = pim_hardware(Size::KB(64), Size::KB(1))?;
    let database = DatabaseProfile::new(32, 4)?.with_blimp_regions(2048, 8192);
    let layout = LayoutPlanner::new(&hardware, &database).plan("blimp".parse()?)?;
    let scratch = layout.mapping().get(Region::BlimpTemp).unwrap_or_default();
    assert_eq!(scratch, RowRange::new(2, 8));

    let mut table = ChainedHashTable::for_rows(BucketFormat::BLIMP, 16, scratch.rows, 1024)?;
    assert_eq!(table.maximum_buckets(), 64);
    for key in 0..600 {
        table.insert(key * 7, 0)?;
    }
    let mut bank = Bank::new(hardware, DEFAULT_BYTE)?;
    table.place(&mut bank, scratch)?;

    let trace = table.traced_fetch(7 * 599);
    assert_eq!(trace.value, Some(0));
    let last = *trace.buckets.last().unwrap_or(&0);
    let row = bank.get_row(scratch.start + table.bucket_row(last, 1024))?;
    let offset = (last % 8) * 128;
    assert_eq!(
        &row.as_bytes()[offset..offset + 128],
        table.buckets()[last].to_word(table.format())?.as_bytes()
    );
    Ok(())
}
