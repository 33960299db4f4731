use alloy::sol;

pub mod utils;

sol! {
    #[sol(rpc)]
    contract SmartWill {
        // ========= Normal wills =========
        function createNormalWill(
            address beneficiary,
            string calldata description,
            uint256 claimWaitTime
        ) external payable;

        function normalWills(address owner)
            external
            view
            returns (
                address beneficiary,
                uint256 amount,
                uint256 lastPingTime,
                uint256 claimWaitTime,
                string memory description,
                bool isClaimed,
                uint256 creationTime
            );

        function hasNormalWill(address owner) external view returns (bool);

        /// Resets the owner's inactivity clock.
        function ping() external;

        /// Adds value to the caller's existing normal will.
        function deposit() external payable;

        function getNormalWillAsBeneficiary(address beneficiary)
            external
            view
            returns (address[] memory owners, uint256[] memory amounts);

        function claimNormalWill(address owner) external;

        // ========= Milestone wills =========
        function createMilestoneWill(
            address[] calldata beneficiaries,
            uint256[] calldata releaseTimes,
            uint256[] calldata releasePercentages,
            string[] calldata descriptions
        ) external payable;

        function getMilestoneWillsAsBeneficiary(address beneficiary)
            external
            view
            returns (
                address[] memory owners,
                uint256[] memory willIndexes,
                uint256[] memory releaseIndexes,
                uint256[] memory releaseAmounts
            );

        function claimMilestoneWill(address owner, uint256 willIndex, uint256 releaseIndex) external;
    }
}
