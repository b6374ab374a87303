use std::io::Write;

use tempfile::NamedTempFile;
use tracing::info;

use super::error::Result;

/// Prepared-CSV rows covering the situations tests care about: ambiguous
/// names across countries, Cyrillic alternates, and an empty alternates cell.
const SAMPLE_PLACES_CSV: &str = "\
geonameid,name,asciiname,alternatenames,latitude,longitude,feature_code,country_code,population,timezone
524901,Moscow,Moscow,\"Moskva,Moskau,Москва,Moscou\",55.75222,37.61556,PPLC,RU,10381222,Europe/Moscow
5601538,Moscow,Moscow,,46.73239,-117.00017,PPLA2,US,25435,America/Los_Angeles
498817,Saint Petersburg,Saint Petersburg,\"Sankt-Peterburg,Санкт-Петербург,Leningrad,Petersburg\",59.93863,30.31413,PPLA,RU,5351935,Europe/Moscow
703448,Kyiv,Kyiv,\"Kiev,Київ,Киев\",50.45466,30.5238,PPLC,UA,2797553,Europe/Kyiv
625144,Minsk,Minsk,\"Мінск,Минск\",53.9,27.56667,PPLC,BY,1742124,Europe/Minsk
1526384,Almaty,Almaty,\"Alma-Ata,Алматы,Алма-Ата\",43.25,76.91667,PPLA,KZ,2000900,Asia/Almaty
611717,Tbilisi,Tbilisi,\"Тбилиси,Tiflis\",41.69411,44.83368,PPLC,GE,1049498,Asia/Tbilisi
473537,Vidnoye,Vidnoye,,55.55,37.70972,PPLA2,RU,56759,Europe/Moscow
";

/// Raw GeoNames dump rows (tab separated, no header). The oblast row has
/// feature class `A` and must be dropped by the loader.
const SAMPLE_DUMP_ROWS: [&str; 4] = [
    "524901\tMoscow\tMoscow\tMoskva,Moskau,Москва\t55.75222\t37.61556\tP\tPPLC\tRU\t\t48\t\t\t\t10381222\t\t144\tEurope/Moscow\t2022-12-10",
    "524925\tMoscow Oblast\tMoscow Oblast\tMoskovskaya Oblast,Подмосковье\t55.75\t37.5\tA\tADM1\tRU\t\t47\t\t\t\t7095120\t\t161\tEurope/Moscow\t2023-01-12",
    "473537\tVidnoye\tVidnoye\t\t55.55\t37.70972\tP\tPPLA2\tRU\t\t47\t\t\t\t56759\t\t160\tEurope/Moscow\t2019-09-05",
    "498817\tSaint Petersburg\tSaint Petersburg\tSankt-Peterburg,Санкт-Петербург,Leningrad\t59.93863\t30.31413\tP\tPPLA\tRU\t\t66\t\t\t\t5351935\t\t11\tEurope/Moscow\t2022-12-13",
];

/// Write the sample prepared dataset to a temporary CSV file.
pub fn create_test_places_csv() -> Result<NamedTempFile> {
    info!("Creating sample places CSV");
    let mut file = NamedTempFile::new()?;
    file.write_all(SAMPLE_PLACES_CSV.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Write the sample raw GeoNames dump to a temporary file.
pub fn create_test_dump() -> Result<NamedTempFile> {
    info!("Creating sample GeoNames dump");
    let mut file = NamedTempFile::new()?;
    for row in SAMPLE_DUMP_ROWS {
        writeln!(file, "{row}")?;
    }
    file.flush()?;
    Ok(file)
}
