//! IANA IPFIX 정보 요소 표
//!
//! <https://www.iana.org/assignments/ipfix/ipfix.xhtml> 의 표준(enterprise 0) 요소 중
//! 플로우 수집에 쓰이는 범위를 담습니다. v9 필드 ID는 1..=127 범위에서 IPFIX와 같습니다.

use super::types::Decoder;

const U8: Decoder = Decoder::Unsigned8;
const U16: Decoder = Decoder::Unsigned16;
const U32: Decoder = Decoder::Unsigned32;
const U64: Decoder = Decoder::Unsigned64;
const F64: Decoder = Decoder::Float64;
const BOOL: Decoder = Decoder::Boolean;
const MAC: Decoder = Decoder::MacAddress;
const OCT: Decoder = Decoder::OctetArray;
const STR: Decoder = Decoder::String;
const DTS: Decoder = Decoder::DateTimeSeconds;
const DTMS: Decoder = Decoder::DateTimeMilliseconds;
const DTUS: Decoder = Decoder::DateTimeMicroseconds;
const DTNS: Decoder = Decoder::DateTimeNanoseconds;
const IP4: Decoder = Decoder::Ipv4Address;
const IP6: Decoder = Decoder::Ipv6Address;
const BASIC: Decoder = Decoder::BasicList;
const STL: Decoder = Decoder::SubTemplateList;
const STML: Decoder = Decoder::SubTemplateMultiList;

/// (필드 ID, 이름, 디코더)
pub(super) const IANA_FIELDS: &[(u16, &str, Decoder)] = &[
    (1, "octetDeltaCount", U64),
    (2, "packetDeltaCount", U64),
    (3, "deltaFlowCount", U64),
    (4, "protocolIdentifier", U8),
    (5, "ipClassOfService", U8),
    (6, "tcpControlBits", U16),
    (7, "sourceTransportPort", U16),
    (8, "sourceIPv4Address", IP4),
    (9, "sourceIPv4PrefixLength", U8),
    (10, "ingressInterface", U32),
    (11, "destinationTransportPort", U16),
    (12, "destinationIPv4Address", IP4),
    (13, "destinationIPv4PrefixLength", U8),
    (14, "egressInterface", U32),
    (15, "ipNextHopIPv4Address", IP4),
    (16, "bgpSourceAsNumber", U32),
    (17, "bgpDestinationAsNumber", U32),
    (18, "bgpNextHopIPv4Address", IP4),
    (19, "postMCastPacketDeltaCount", U64),
    (20, "postMCastOctetDeltaCount", U64),
    (21, "flowEndSysUpTime", U32),
    (22, "flowStartSysUpTime", U32),
    (23, "postOctetDeltaCount", U64),
    (24, "postPacketDeltaCount", U64),
    (25, "minimumIpTotalLength", U64),
    (26, "maximumIpTotalLength", U64),
    (27, "sourceIPv6Address", IP6),
    (28, "destinationIPv6Address", IP6),
    (29, "sourceIPv6PrefixLength", U8),
    (30, "destinationIPv6PrefixLength", U8),
    (31, "flowLabelIPv6", U32),
    (32, "icmpTypeCodeIPv4", U16),
    (33, "igmpType", U8),
    (34, "samplingInterval", U32),
    (35, "samplingAlgorithm", U8),
    (36, "flowActiveTimeout", U16),
    (37, "flowIdleTimeout", U16),
    (38, "engineType", U8),
    (39, "engineId", U8),
    (40, "exportedOctetTotalCount", U64),
    (41, "exportedMessageTotalCount", U64),
    (42, "exportedFlowRecordTotalCount", U64),
    (43, "ipv4RouterSc", IP4),
    (44, "sourceIPv4Prefix", IP4),
    (45, "destinationIPv4Prefix", IP4),
    (46, "mplsTopLabelType", U8),
    (47, "mplsTopLabelIPv4Address", IP4),
    (48, "samplerId", U8),
    (49, "samplerMode", U8),
    (50, "samplerRandomInterval", U32),
    (51, "classId", U8),
    (52, "minimumTTL", U8),
    (53, "maximumTTL", U8),
    (54, "fragmentIdentification", U32),
    (55, "postIpClassOfService", U8),
    (56, "sourceMacAddress", MAC),
    (57, "postDestinationMacAddress", MAC),
    (58, "vlanId", U16),
    (59, "postVlanId", U16),
    (60, "ipVersion", U8),
    (61, "flowDirection", U8),
    (62, "ipNextHopIPv6Address", IP6),
    (63, "bgpNextHopIPv6Address", IP6),
    (64, "ipv6ExtensionHeaders", U32),
    (70, "mplsTopLabelStackSection", OCT),
    (71, "mplsLabelStackSection2", OCT),
    (72, "mplsLabelStackSection3", OCT),
    (73, "mplsLabelStackSection4", OCT),
    (74, "mplsLabelStackSection5", OCT),
    (75, "mplsLabelStackSection6", OCT),
    (76, "mplsLabelStackSection7", OCT),
    (77, "mplsLabelStackSection8", OCT),
    (78, "mplsLabelStackSection9", OCT),
    (79, "mplsLabelStackSection10", OCT),
    (80, "destinationMacAddress", MAC),
    (81, "postSourceMacAddress", MAC),
    (82, "interfaceName", STR),
    (83, "interfaceDescription", STR),
    (84, "samplerName", STR),
    (85, "octetTotalCount", U64),
    (86, "packetTotalCount", U64),
    (87, "flagsAndSamplerId", U32),
    (88, "fragmentOffset", U16),
    (89, "forwardingStatus", U32),
    (90, "mplsVpnRouteDistinguisher", OCT),
    (91, "mplsTopLabelPrefixLength", U8),
    (92, "srcTrafficIndex", U32),
    (93, "dstTrafficIndex", U32),
    (94, "applicationDescription", STR),
    (95, "applicationId", OCT),
    (96, "applicationName", STR),
    (98, "postIpDiffServCodePoint", U8),
    (99, "multicastReplicationFactor", U32),
    (100, "className", STR),
    (101, "classificationEngineId", U8),
    (102, "layer2packetSectionOffset", U16),
    (103, "layer2packetSectionSize", U16),
    (104, "layer2packetSectionData", OCT),
    (128, "bgpNextAdjacentAsNumber", U32),
    (129, "bgpPrevAdjacentAsNumber", U32),
    (130, "exporterIPv4Address", IP4),
    (131, "exporterIPv6Address", IP6),
    (132, "droppedOctetDeltaCount", U64),
    (133, "droppedPacketDeltaCount", U64),
    (134, "droppedOctetTotalCount", U64),
    (135, "droppedPacketTotalCount", U64),
    (136, "flowEndReason", U8),
    (137, "commonPropertiesId", U64),
    (138, "observationPointId", U64),
    (139, "icmpTypeCodeIPv6", U16),
    (140, "mplsTopLabelIPv6Address", IP6),
    (141, "lineCardId", U32),
    (142, "portId", U32),
    (143, "meteringProcessId", U32),
    (144, "exportingProcessId", U32),
    (145, "templateId", U16),
    (146, "wlanChannelId", U8),
    (147, "wlanSSID", STR),
    (148, "flowId", U64),
    (149, "observationDomainId", U32),
    (150, "flowStartSeconds", DTS),
    (151, "flowEndSeconds", DTS),
    (152, "flowStartMilliseconds", DTMS),
    (153, "flowEndMilliseconds", DTMS),
    (154, "flowStartMicroseconds", DTUS),
    (155, "flowEndMicroseconds", DTUS),
    (156, "flowStartNanoseconds", DTNS),
    (157, "flowEndNanoseconds", DTNS),
    (158, "flowStartDeltaMicroseconds", U32),
    (159, "flowEndDeltaMicroseconds", U32),
    (160, "systemInitTimeMilliseconds", DTMS),
    (161, "flowDurationMilliseconds", U32),
    (162, "flowDurationMicroseconds", U32),
    (163, "observedFlowTotalCount", U64),
    (164, "ignoredPacketTotalCount", U64),
    (165, "ignoredOctetTotalCount", U64),
    (166, "notSentFlowTotalCount", U64),
    (167, "notSentPacketTotalCount", U64),
    (168, "notSentOctetTotalCount", U64),
    (169, "destinationIPv6Prefix", IP6),
    (170, "sourceIPv6Prefix", IP6),
    (171, "postOctetTotalCount", U64),
    (172, "postPacketTotalCount", U64),
    (173, "flowKeyIndicator", U64),
    (174, "postMCastPacketTotalCount", U64),
    (175, "postMCastOctetTotalCount", U64),
    (176, "icmpTypeIPv4", U8),
    (177, "icmpCodeIPv4", U8),
    (178, "icmpTypeIPv6", U8),
    (179, "icmpCodeIPv6", U8),
    (180, "udpSourcePort", U16),
    (181, "udpDestinationPort", U16),
    (182, "tcpSourcePort", U16),
    (183, "tcpDestinationPort", U16),
    (184, "tcpSequenceNumber", U32),
    (185, "tcpAcknowledgementNumber", U32),
    (186, "tcpWindowSize", U16),
    (187, "tcpUrgentPointer", U16),
    (188, "tcpHeaderLength", U8),
    (189, "ipHeaderLength", U8),
    (190, "totalLengthIPv4", U16),
    (191, "payloadLengthIPv6", U16),
    (192, "ipTTL", U8),
    (193, "nextHeaderIPv6", U8),
    (194, "mplsPayloadLength", U32),
    (195, "ipDiffServCodePoint", U8),
    (196, "ipPrecedence", U8),
    (197, "fragmentFlags", U8),
    (198, "octetDeltaSumOfSquares", U64),
    (199, "octetTotalSumOfSquares", U64),
    (200, "mplsTopLabelTTL", U8),
    (201, "mplsLabelStackLength", U32),
    (202, "mplsLabelStackDepth", U32),
    (203, "mplsTopLabelExp", U8),
    (204, "ipPayloadLength", U32),
    (205, "udpMessageLength", U16),
    (206, "isMulticast", U8),
    (207, "ipv4IHL", U8),
    (208, "ipv4Options", U32),
    (209, "tcpOptions", U64),
    (210, "paddingOctets", OCT),
    (211, "collectorIPv4Address", IP4),
    (212, "collectorIPv6Address", IP6),
    (213, "exportInterface", U32),
    (214, "exportProtocolVersion", U8),
    (215, "exportTransportProtocol", U8),
    (216, "collectorTransportPort", U16),
    (217, "exporterTransportPort", U16),
    (218, "tcpSynTotalCount", U64),
    (219, "tcpFinTotalCount", U64),
    (220, "tcpRstTotalCount", U64),
    (221, "tcpPshTotalCount", U64),
    (222, "tcpAckTotalCount", U64),
    (223, "tcpUrgTotalCount", U64),
    (224, "ipTotalLength", U64),
    (225, "postNATSourceIPv4Address", IP4),
    (226, "postNATDestinationIPv4Address", IP4),
    (227, "postNAPTSourceTransportPort", U16),
    (228, "postNAPTDestinationTransportPort", U16),
    (229, "natOriginatingAddressRealm", U8),
    (230, "natEvent", U8),
    (231, "initiatorOctets", U64),
    (232, "responderOctets", U64),
    (233, "firewallEvent", U8),
    (234, "ingressVRFID", U32),
    (235, "egressVRFID", U32),
    (236, "VRFname", STR),
    (237, "postMplsTopLabelExp", U8),
    (238, "tcpWindowScale", U16),
    (239, "biflowDirection", U8),
    (240, "ethernetHeaderLength", U8),
    (241, "ethernetPayloadLength", U16),
    (242, "ethernetTotalLength", U16),
    (243, "dot1qVlanId", U16),
    (244, "dot1qPriority", U8),
    (245, "dot1qCustomerVlanId", U16),
    (246, "dot1qCustomerPriority", U8),
    (247, "metroEvcId", STR),
    (248, "metroEvcType", U8),
    (249, "pseudoWireId", U32),
    (250, "pseudoWireType", U16),
    (251, "pseudoWireControlWord", U32),
    (252, "ingressPhysicalInterface", U32),
    (253, "egressPhysicalInterface", U32),
    (254, "postDot1qVlanId", U16),
    (255, "postDot1qCustomerVlanId", U16),
    (256, "ethernetType", U16),
    (257, "postIpPrecedence", U8),
    (258, "collectionTimeMilliseconds", DTMS),
    (259, "exportSctpStreamId", U16),
    (260, "maxExportSeconds", DTS),
    (261, "maxFlowEndSeconds", DTS),
    (262, "messageMD5Checksum", OCT),
    (263, "messageScope", U8),
    (264, "minExportSeconds", DTS),
    (265, "minFlowStartSeconds", DTS),
    (266, "opaqueOctets", OCT),
    (267, "sessionScope", U8),
    (268, "maxFlowEndMicroseconds", DTUS),
    (269, "maxFlowEndMilliseconds", DTMS),
    (270, "maxFlowEndNanoseconds", DTNS),
    (271, "minFlowStartMicroseconds", DTUS),
    (272, "minFlowStartMilliseconds", DTMS),
    (273, "minFlowStartNanoseconds", DTNS),
    (274, "collectorCertificate", OCT),
    (275, "exporterCertificate", OCT),
    (276, "dataRecordsReliability", BOOL),
    (277, "observationPointType", U8),
    (278, "newConnectionDeltaCount", U32),
    (279, "connectionSumDurationSeconds", U64),
    (280, "connectionTransactionId", U64),
    (281, "postNATSourceIPv6Address", IP6),
    (282, "postNATDestinationIPv6Address", IP6),
    (283, "natPoolId", U32),
    (284, "natPoolName", STR),
    (285, "anonymizationFlags", U16),
    (286, "anonymizationTechnique", U16),
    (287, "informationElementIndex", U16),
    (288, "p2pTechnology", STR),
    (289, "tunnelTechnology", STR),
    (290, "encryptedTechnology", STR),
    (291, "basicList", BASIC),
    (292, "subTemplateList", STL),
    (293, "subTemplateMultiList", STML),
    (294, "bgpValidityState", U8),
    (295, "IPSecSPI", U32),
    (296, "greKey", U32),
    (297, "natType", U8),
    (298, "initiatorPackets", U64),
    (299, "responderPackets", U64),
    (300, "observationDomainName", STR),
    (301, "selectionSequenceId", U64),
    (302, "selectorId", U64),
    (303, "informationElementId", U16),
    (304, "selectorAlgorithm", U16),
    (305, "samplingPacketInterval", U32),
    (306, "samplingPacketSpace", U32),
    (307, "samplingTimeInterval", U32),
    (308, "samplingTimeSpace", U32),
    (309, "samplingSize", U32),
    (310, "samplingPopulation", U32),
    (311, "samplingProbability", F64),
    (312, "dataLinkFrameSize", U16),
    (313, "ipHeaderPacketSection", OCT),
    (314, "ipPayloadPacketSection", OCT),
    (315, "dataLinkFrameSection", OCT),
    (316, "mplsLabelStackSection", OCT),
    (317, "mplsPayloadPacketSection", OCT),
    (318, "selectorIdTotalPktsObserved", U64),
    (319, "selectorIdTotalPktsSelected", U64),
    (320, "absoluteError", F64),
    (321, "relativeError", F64),
    (322, "observationTimeSeconds", DTS),
    (323, "observationTimeMilliseconds", DTMS),
    (324, "observationTimeMicroseconds", DTUS),
    (325, "observationTimeNanoseconds", DTNS),
    (326, "digestHashValue", U64),
    (327, "hashIPPayloadOffset", U64),
    (328, "hashIPPayloadSize", U64),
    (329, "hashOutputRangeMin", U64),
    (330, "hashOutputRangeMax", U64),
    (331, "hashSelectedRangeMin", U64),
    (332, "hashSelectedRangeMax", U64),
    (333, "hashDigestOutput", BOOL),
    (334, "hashInitialiserValue", U64),
    (335, "selectorName", STR),
    (336, "upperCILimit", F64),
    (337, "lowerCILimit", F64),
    (338, "confidenceLevel", F64),
    (339, "informationElementDataType", U8),
    (340, "informationElementDescription", STR),
    (341, "informationElementName", STR),
    (342, "informationElementRangeBegin", U64),
    (343, "informationElementRangeEnd", U64),
    (344, "informationElementSemantics", U8),
    (345, "informationElementUnits", U16),
    (346, "privateEnterpriseNumber", U32),
    (347, "virtualStationInterfaceId", OCT),
    (348, "virtualStationInterfaceName", STR),
    (349, "virtualStationUUID", OCT),
    (350, "virtualStationName", STR),
    (351, "layer2SegmentId", U64),
    (352, "layer2OctetDeltaCount", U64),
    (353, "layer2OctetTotalCount", U64),
    (354, "ingressUnicastPacketTotalCount", U64),
    (355, "ingressMulticastPacketTotalCount", U64),
    (356, "ingressBroadcastPacketTotalCount", U64),
    (357, "egressUnicastPacketTotalCount", U64),
    (358, "egressBroadcastPacketTotalCount", U64),
    (359, "monitoringIntervalStartMilliSeconds", DTMS),
    (360, "monitoringIntervalEndMilliSeconds", DTMS),
    (361, "portRangeStart", U16),
    (362, "portRangeEnd", U16),
    (363, "portRangeStepSize", U16),
    (364, "portRangeNumPorts", U16),
    (365, "staMacAddress", MAC),
    (366, "staIPv4Address", IP4),
    (367, "wtpMacAddress", MAC),
    (368, "ingressInterfaceType", U32),
    (369, "egressInterfaceType", U32),
    (370, "rtpSequenceNumber", U16),
    (371, "userName", STR),
    (372, "applicationCategoryName", STR),
    (373, "applicationSubCategoryName", STR),
    (374, "applicationGroupName", STR),
    (375, "originalFlowsPresent", U64),
    (376, "originalFlowsInitiated", U64),
    (377, "originalFlowsCompleted", U64),
    (378, "distinctCountOfSourceIPAddress", U64),
    (379, "distinctCountOfDestinationIPAddress", U64),
    (380, "distinctCountOfSourceIPv4Address", U32),
    (381, "distinctCountOfDestinationIPv4Address", U32),
    (382, "distinctCountOfSourceIPv6Address", U64),
    (383, "distinctCountOfDestinationIPv6Address", U64),
    (384, "valueDistributionMethod", U8),
    (385, "rfc3550JitterMilliseconds", U32),
    (386, "rfc3550JitterMicroseconds", U32),
    (387, "rfc3550JitterNanoseconds", U32),
    (388, "dot1qDEI", BOOL),
    (389, "dot1qCustomerDEI", BOOL),
];
