pub mod report_dto;

pub use report_dto::{
    AssignInstitutionDto, AssignedDto, DurationDto, ReportCreatedDto, ReportListDto,
    ReportResponseDto, StatusHistoryEntryDto, StatusHistoryListDto, StatusUpdatedDto,
    SubmitReportDto, UpdateStatusDto,
};
