use chrono::NaiveDate;
use ridership_pipeline::consolidate::ConsolidateConfig;
use ridership_pipeline::features::FeaturePipeline;
use ridership_pipeline::pipeline::{PipelineConfig, run};
use ridership_pipeline::sources::{SourceEncoding, SourceFile, SourceManifest};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const HOLIDAYS: &str = "date,annee,zone,nom_jour_ferie\n\
    2020-04-13,2020,Métropole,Lundi de Pâques\n\
    2020-05-01,2020,Métropole,1er mai\n";

const SCHOOL: &str = "Description;Population;Date de début;Date de fin;Zones;annee_scolaire;Académies\n\
    Vacances de Printemps;-;2020-04-04T00:00:00+02:00;2020-04-20T00:00:00+02:00;Zone C;2019-2020;Paris\n\
    Vacances de Printemps;-;2020-04-18T00:00:00+02:00;2020-05-04T00:00:00+02:00;Zone B;2019-2020;Lille\n";

const STATIONS: &str = "NOM_GARE;X;Y;Geo Point\n\
    Gare de Lyon;652000;6861000;48.844, 2.374\n";

fn fixture_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("jours_feries_metropole.csv"), HOLIDAYS).unwrap();
    fs::write(dir.join("fr-en-calendrier-scolaire.csv"), SCHOOL).unwrap();
    fs::write(dir.join("schema_gares-gf.csv"), STATIONS).unwrap();

    // UTF-8, semicolon, day-first dates, text counts
    fs::write(
        dir.join("2020S1.csv"),
        "JOUR;CODE_STIF_TRNS;CODE_STIF_ARRET;LIBELLE_ARRET;CATEGORIE_TITRE;NB_VALD\n\
         01/04/2020;100;71;Gare de Lyon;NAVIGO;10\n\
         02/04/2020;100;71;Gare de Lyon;NAVIGO;1 200\n\
         01/04/2020;100;99;Petite Halte;NAVIGO;Moins de 5\n",
    )
    .unwrap();

    // UTF-16LE with BOM, tab, ISO dates, numeric counts
    let text = "jour\tcode_stif_trns\tcode_stif_arret\tlibelle_arret\tcategorie_titre\tnb_vald\n\
                2020-04-01\t100\t71\tGARE DE LYON \tIMAGINE R\t15\n\
                2020-04-11\t100\t71\tGARE DE LYON\tNAVIGO\t300\n";
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    fs::write(dir.join("2020S2.txt"), bytes).unwrap();

    // Windows-1252, tab
    let text = "JOUR\tCODE_STIF_TRNS\tCODE_STIF_ARRET\tLIBELLE_ARRET\tCATEGORIE_TITRE\tNB_VALD\n\
                2020-05-01\t100\t80\tCréteil\tNAVIGO\t40\n\
                2020-05-02\t100\t80\tCréteil\tNAVIGO\t41\n\
                2020-05-02\t100\t80\tCréteil\tNAVIGO\t41\n";
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(text);
    fs::write(dir.join("2020T3.txt"), bytes.as_ref()).unwrap();

    dir
}

fn config(dir: &Path, min_observations: usize) -> PipelineConfig {
    let mut config = PipelineConfig::for_data_dir(dir);
    config.manifest = SourceManifest::new(vec![
        SourceFile::csv("2020S1"),
        SourceFile::txt("2020S2").with_encoding(SourceEncoding::Utf16le),
        SourceFile::txt("2020T3").with_encoding(SourceEncoding::Windows1252),
    ]);
    config.consolidate = ConsolidateConfig { min_observations };
    config
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_full_pipeline() {
    let dir = fixture_dir("ridership_pipeline_it_full");
    let output = run(&config(&dir, 2)).expect("pipeline failed");

    // PETITE HALTE has a single date and is filtered out
    assert_eq!(output.consolidated.report.stations_kept, 2);
    assert_eq!(output.consolidated.report.stations_dropped, 1);
    assert!(output.rows.iter().all(|r| r.station_name != "PETITE HALTE"));

    let lyon_first = output
        .rows
        .iter()
        .find(|r| r.station_name == "GARE DE LYON" && r.date == ymd(2020, 4, 1))
        .unwrap();
    assert_eq!(lyon_first.total_validations, 25);
    assert_eq!(lyon_first.is_lockdown, Some(true));
    assert_eq!(lyon_first.is_school_holiday, Some(false));
    assert_eq!(lyon_first.is_spring, Some(true));

    let lyon_saturday = output
        .rows
        .iter()
        .find(|r| r.station_name == "GARE DE LYON" && r.date == ymd(2020, 4, 11))
        .unwrap();
    assert_eq!(lyon_saturday.is_school_holiday, Some(true));
    assert_eq!(lyon_saturday.weekend_school_holiday, Some(true));

    let second = output
        .rows
        .iter()
        .find(|r| r.date == ymd(2020, 4, 2))
        .unwrap();
    assert_eq!(second.total_validations, 1200);

    let creteil: Vec<_> = output
        .rows
        .iter()
        .filter(|r| r.station_name == "CRÉTEIL")
        .collect();
    assert_eq!(creteil.len(), 2);
    assert_eq!(creteil[0].holiday_name.as_deref(), Some("1er mai"));
    // duplicated row collapsed before summing
    assert_eq!(creteil[1].total_validations, 41);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_rederive_on_output_is_stable() {
    let dir = fixture_dir("ridership_pipeline_it_rederive");
    let output = run(&config(&dir, 0)).unwrap();

    let reference = ridership_pipeline::reference::ReferenceData::load(
        &ridership_pipeline::reference::ReferencePaths::in_dir(&dir),
        &Default::default(),
    )
    .unwrap();
    let mut again = output.rows.clone();
    FeaturePipeline::default().rederive(&mut again, &reference);
    assert_eq!(again, output.rows);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_extract_is_fatal() {
    let dir = fixture_dir("ridership_pipeline_it_missing");
    let mut config = config(&dir, 0);
    config.manifest = SourceManifest::new(vec![SourceFile::csv("absent")]);

    assert!(run(&config).is_err());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_wrong_encoding_is_fatal() {
    let dir = fixture_dir("ridership_pipeline_it_encoding");
    let mut config = config(&dir, 0);
    // the Windows-1252 file is not valid UTF-8
    config.manifest = SourceManifest::new(vec![SourceFile::txt("2020T3")]);

    assert!(run(&config).is_err());

    fs::remove_dir_all(&dir).unwrap();
}
